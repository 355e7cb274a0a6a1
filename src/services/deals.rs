use crate::{
    db::DbPool,
    entities::customer::Entity as CustomerEntity,
    entities::deal::{
        self, ActiveModel as DealActiveModel, Entity as DealEntity, Model as DealModel,
    },
    entities::payment::{self, ActiveModel as PaymentActiveModel, Entity as PaymentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::deal_number,
    services::payments::PaymentMethod,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Attempts at deal-number assignment before giving up. Each retry re-counts
/// the customer's deals, so a conflict with a concurrent creator advances the
/// sequence.
const NUMBER_ASSIGN_ATTEMPTS: u32 = 3;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateDealRequest {
    pub customer_id: Uuid,
    pub requirement: Option<String>,
    pub deal_value: Decimal,
    pub deal_approval_value: Decimal,
    #[serde(default)]
    pub advance_payment: Decimal,
    /// Remaining balance at creation. Defaults to
    /// `deal_approval_value - advance_payment` when omitted.
    pub balance_amount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateDealRequest {
    pub id: Uuid,
    pub requirement: Option<String>,
    pub deal_value: Option<Decimal>,
    pub deal_approval_value: Option<Decimal>,
    pub advance_payment: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DealResponse {
    pub id: Uuid,
    pub deal_number: String,
    pub customer_id: Uuid,
    pub company_id: i64,
    pub requirement: Option<String>,
    pub deal_value: Decimal,
    pub deal_approval_value: Decimal,
    pub advance_payment: Decimal,
    pub balance_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Service owning the deal lifecycle. `balance_amount` is written only here
/// and in the payment ledger.
#[derive(Clone)]
pub struct DealService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DealService {
    /// Creates a new deal service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a deal with a freshly assigned number; when the request carries
    /// an advance payment, the corresponding `Advance` ledger entry is
    /// inserted in the same transaction.
    #[instrument(skip(self, request), fields(company_id = company_id, customer_id = %request.customer_id))]
    pub async fn create_deal(
        &self,
        company_id: i64,
        request: CreateDealRequest,
    ) -> Result<DealResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.deal_value < Decimal::ZERO || request.deal_approval_value < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Deal values must not be negative".to_string(),
            ));
        }
        if request.advance_payment < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Advance payment must not be negative".to_string(),
            ));
        }
        if request.advance_payment > request.deal_approval_value {
            return Err(ServiceError::LedgerViolation(format!(
                "Advance payment {} exceeds approved value {}",
                request.advance_payment, request.deal_approval_value
            )));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create_deal(company_id, &request).await {
                Err(ServiceError::DatabaseError(e))
                    if ServiceError::is_unique_violation(&e)
                        && attempt < NUMBER_ASSIGN_ATTEMPTS =>
                {
                    warn!(
                        attempt,
                        "Deal number conflict with concurrent creation, retrying"
                    );
                    continue;
                }
                Ok(response) => {
                    info!(deal_id = %response.id, deal_number = %response.deal_number, "Deal created successfully");

                    if let Some(event_sender) = &self.event_sender {
                        if let Err(e) = event_sender
                            .send(Event::DealCreated {
                                deal_id: response.id,
                                deal_number: response.deal_number.clone(),
                            })
                            .await
                        {
                            warn!(error = %e, deal_id = %response.id, "Failed to send deal created event");
                        }
                    }

                    return Ok(response);
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// One create attempt: customer lookup, number assignment, deal insert,
    /// optional advance payment, all inside one transaction.
    async fn try_create_deal(
        &self,
        company_id: i64,
        request: &CreateDealRequest,
    ) -> Result<DealResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let deal_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for deal creation");
            ServiceError::DatabaseError(e)
        })?;

        let customer = CustomerEntity::find_by_id(request.customer_id)
            .filter(crate::entities::customer::Column::CompanyId.eq(company_id))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(customer_id = %request.customer_id, "Customer not found for deal creation");
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let number =
            deal_number::next_deal_number(&txn, customer.id, &customer.name, now).await?;

        let balance = request
            .balance_amount
            .unwrap_or(request.deal_approval_value - request.advance_payment);

        let deal_active_model = DealActiveModel {
            id: Set(deal_id),
            deal_number: Set(number.clone()),
            customer_id: Set(customer.id),
            company_id: Set(company_id),
            requirement: Set(request.requirement.clone()),
            deal_value: Set(request.deal_value),
            deal_approval_value: Set(request.deal_approval_value),
            advance_payment: Set(request.advance_payment),
            balance_amount: Set(balance),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let deal_model = deal_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, deal_number = %number, "Failed to insert deal");
            ServiceError::DatabaseError(e)
        })?;

        if request.advance_payment > Decimal::ZERO {
            let advance = PaymentActiveModel {
                id: Set(Uuid::new_v4()),
                deal_id: Set(deal_id),
                amount: Set(request.advance_payment),
                payment_date: Set(now),
                payment_method: Set(PaymentMethod::Advance.label().to_string()),
                remarks: Set(Some("Advance payment at deal creation".to_string())),
                created_by_id: Set(None),
                created_at: Set(now),
            };
            advance.insert(&txn).await.map_err(|e| {
                error!(error = %e, deal_id = %deal_id, "Failed to insert advance payment");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, deal_id = %deal_id, "Failed to commit deal creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        Ok(model_to_response(deal_model))
    }

    /// Applies the supplied fields and recomputes `balance_amount` as
    /// `deal_approval_value - SUM(payments)` using post-update values. The
    /// recorded ledger always wins over the stored balance here.
    #[instrument(skip(self, request), fields(company_id = company_id, deal_id = %request.id))]
    pub async fn update_deal(
        &self,
        company_id: i64,
        request: UpdateDealRequest,
    ) -> Result<DealResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for deal update");
            ServiceError::DatabaseError(e)
        })?;

        let deal = DealEntity::find_by_id(request.id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Deal {} not found", request.id)))?;

        if deal.company_id != company_id {
            return Err(ServiceError::Forbidden(
                "Deal belongs to a different company".to_string(),
            ));
        }

        let paid = paid_total(&txn, deal.id).await?;

        let new_approval = request.deal_approval_value.unwrap_or(deal.deal_approval_value);
        if new_approval < paid {
            return Err(ServiceError::LedgerViolation(format!(
                "Approved value {} is below the {} already paid",
                new_approval, paid
            )));
        }

        let mut active: DealActiveModel = deal.into();
        if let Some(requirement) = request.requirement.clone() {
            active.requirement = Set(Some(requirement));
        }
        if let Some(deal_value) = request.deal_value {
            active.deal_value = Set(deal_value);
        }
        if let Some(approval) = request.deal_approval_value {
            active.deal_approval_value = Set(approval);
        }
        if let Some(advance) = request.advance_payment {
            active.advance_payment = Set(advance);
        }
        active.balance_amount = Set(new_approval - paid);
        active.updated_at = Set(Some(now));

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, deal_id = %request.id, "Failed to update deal");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, deal_id = %request.id, "Failed to commit deal update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(deal_id = %updated.id, "Deal updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DealUpdated(updated.id)).await {
                warn!(error = %e, deal_id = %updated.id, "Failed to send deal updated event");
            }
        }

        Ok(model_to_response(updated))
    }

    /// Deletes a deal together with its payments in one transaction.
    #[instrument(skip(self), fields(company_id = company_id, deal_id = %deal_id))]
    pub async fn delete_deal(&self, company_id: i64, deal_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for deal deletion");
            ServiceError::DatabaseError(e)
        })?;

        let deal = DealEntity::find_by_id(deal_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Deal {} not found", deal_id)))?;

        if deal.company_id != company_id {
            return Err(ServiceError::Forbidden(
                "Deal belongs to a different company".to_string(),
            ));
        }

        PaymentEntity::delete_many()
            .filter(payment::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, deal_id = %deal_id, "Failed to delete payments for deal");
                ServiceError::DatabaseError(e)
            })?;

        DealEntity::delete_by_id(deal_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, deal_id = %deal_id, "Failed to delete deal");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, deal_id = %deal_id, "Failed to commit deal deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(deal_id = %deal_id, "Deal deleted with its payments");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DealDeleted(deal_id)).await {
                warn!(error = %e, deal_id = %deal_id, "Failed to send deal deleted event");
            }
        }

        Ok(())
    }
}

/// Sum of a deal's payment amounts within the given connection scope.
pub(crate) async fn paid_total<C: sea_orm::ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let paid: Option<Option<Decimal>> = PaymentEntity::find()
        .select_only()
        .column_as(payment::Column::Amount.sum(), "paid")
        .filter(payment::Column::DealId.eq(deal_id))
        .into_tuple()
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(paid.flatten().unwrap_or(Decimal::ZERO))
}

/// Converts a deal model to response format
pub(crate) fn model_to_response(model: DealModel) -> DealResponse {
    DealResponse {
        id: model.id,
        deal_number: model.deal_number,
        customer_id: model.customer_id,
        company_id: model.company_id,
        requirement: model.requirement,
        deal_value: model.deal_value,
        deal_approval_value: model.deal_approval_value,
        advance_payment: model.advance_payment,
        balance_amount: model.balance_amount,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_model_to_response_conversion() {
        let now = Utc::now();
        let deal_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();

        let model = DealModel {
            id: deal_id,
            deal_number: "ACME0608001".to_string(),
            customer_id,
            company_id: 7,
            requirement: Some("CNC machine retrofit".to_string()),
            deal_value: dec!(10000),
            deal_approval_value: dec!(9000),
            advance_payment: dec!(2000),
            balance_amount: dec!(7000),
            created_at: now,
            updated_at: Some(now),
        };

        let response = model_to_response(model);

        assert_eq!(response.id, deal_id);
        assert_eq!(response.customer_id, customer_id);
        assert_eq!(response.deal_number, "ACME0608001");
        assert_eq!(response.balance_amount, dec!(7000));
    }
}
