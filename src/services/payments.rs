use crate::{
    db::DbPool,
    entities::deal::{self, Entity as DealEntity, Model as DealModel},
    entities::employee::{self, Entity as EmployeeEntity},
    entities::payment::{
        self, ActiveModel as PaymentActiveModel, Entity as PaymentEntity, Model as PaymentModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Accepted payment instruments. Stored in the database by wire label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    OnlinePayment,
    Card,
    Upi,
    /// Reserved for the ledger entry created with the deal itself.
    Advance,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::BankTransfer => "Bank Transfer",
            Self::Cheque => "Cheque",
            Self::OnlinePayment => "Online Payment",
            Self::Card => "Credit/Debit Card",
            Self::Upi => "UPI",
            Self::Advance => "Advance",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError(
                "payment method cannot be empty".to_string(),
            ));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "bank transfer" | "bank_transfer" => Ok(Self::BankTransfer),
            "cheque" | "check" => Ok(Self::Cheque),
            "online payment" | "online_payment" => Ok(Self::OnlinePayment),
            "credit/debit card" | "card" | "credit_card" | "debit_card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "advance" => Ok(Self::Advance),
            other => Err(ServiceError::ValidationError(format!(
                "invalid payment method: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecordPaymentRequest {
    pub deal_id: Uuid,
    pub amount: Decimal,
    /// Defaults to now when omitted.
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub remarks: Option<String>,
    pub created_by_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdatePaymentRequest {
    pub id: Uuid,
    pub amount: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub remarks: Option<String>,
    pub created_by_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub remarks: Option<String>,
    pub created_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Payment annotated with the identity of the employee who recorded it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentWithRecorder {
    #[serde(flatten)]
    pub payment: PaymentResponse,
    pub recorded_by_name: Option<String>,
    pub recorded_by_email: Option<String>,
}

/// Append-style ledger over a deal's payments. Every write here moves the
/// owning deal's `balance_amount` in the same transaction, through a
/// conditional relative update so concurrent writers cannot lose a decrement
/// or overdraw the approved value.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PaymentService {
    /// Creates a new payment service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a payment against a deal and decrements the balance.
    #[instrument(skip(self, request), fields(company_id = company_id, deal_id = %request.deal_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        company_id: i64,
        request: RecordPaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        let method = PaymentMethod::parse(&request.payment_method)?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let payment_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment recording");
            ServiceError::DatabaseError(e)
        })?;

        let deal = find_tenant_deal(&txn, company_id, request.deal_id).await?;
        if let Some(employee_id) = request.created_by_id {
            ensure_employee(&txn, company_id, employee_id).await?;
        }

        debit_balance(&txn, deal.id, request.amount).await?;

        let payment_active_model = PaymentActiveModel {
            id: Set(payment_id),
            deal_id: Set(deal.id),
            amount: Set(request.amount),
            payment_date: Set(request.payment_date.unwrap_or(now)),
            payment_method: Set(method.label().to_string()),
            remarks: Set(request.remarks.clone()),
            created_by_id: Set(request.created_by_id),
            created_at: Set(now),
        };

        let payment_model = payment_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, payment_id = %payment_id, "Failed to insert payment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_id = %payment_id, "Failed to commit payment transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(payment_id = %payment_id, deal_id = %deal.id, "Payment recorded successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentRecorded {
                    payment_id,
                    deal_id: deal.id,
                    amount: request.amount,
                })
                .await
            {
                warn!(error = %e, payment_id = %payment_id, "Failed to send payment recorded event");
            }
        }

        Ok(model_to_response(payment_model))
    }

    /// Rewrites a payment's fields and moves the deal balance by the amount
    /// delta, so the ledger invariant survives edits.
    #[instrument(skip(self, request), fields(company_id = company_id, payment_id = %request.id))]
    pub async fn update_payment(
        &self,
        company_id: i64,
        request: UpdatePaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
        let method = PaymentMethod::parse(&request.payment_method)?;

        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment update");
            ServiceError::DatabaseError(e)
        })?;

        let existing = PaymentEntity::find_by_id(request.id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", request.id)))?;

        let deal = find_tenant_deal(&txn, company_id, existing.deal_id).await?;
        if let Some(employee_id) = request.created_by_id {
            ensure_employee(&txn, company_id, employee_id).await?;
        }

        let old_amount = existing.amount;
        if request.amount > old_amount {
            debit_balance(&txn, deal.id, request.amount - old_amount).await?;
        } else if request.amount < old_amount {
            credit_balance(&txn, deal.id, old_amount - request.amount).await?;
        }

        let mut active: PaymentActiveModel = existing.into();
        active.amount = Set(request.amount);
        if let Some(date) = request.payment_date {
            active.payment_date = Set(date);
        }
        active.payment_method = Set(method.label().to_string());
        active.remarks = Set(request.remarks.clone());
        active.created_by_id = Set(request.created_by_id);

        let updated = active.update(&txn).await.map_err(|e| {
            error!(error = %e, payment_id = %request.id, "Failed to update payment");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_id = %request.id, "Failed to commit payment update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(payment_id = %updated.id, old_amount = %old_amount, new_amount = %updated.amount, "Payment updated, balance adjusted by delta");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentUpdated {
                    payment_id: updated.id,
                    deal_id: deal.id,
                    old_amount,
                    new_amount: updated.amount,
                })
                .await
            {
                warn!(error = %e, payment_id = %updated.id, "Failed to send payment updated event");
            }
        }

        Ok(model_to_response(updated))
    }

    /// Deletes a payment and reverses its effect on the deal balance.
    #[instrument(skip(self), fields(company_id = company_id, payment_id = %payment_id))]
    pub async fn delete_payment(
        &self,
        company_id: i64,
        payment_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for payment deletion");
            ServiceError::DatabaseError(e)
        })?;

        let existing = PaymentEntity::find_by_id(payment_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        let deal = find_tenant_deal(&txn, company_id, existing.deal_id).await?;
        let amount = existing.amount;

        PaymentEntity::delete_by_id(payment_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, payment_id = %payment_id, "Failed to delete payment");
                ServiceError::DatabaseError(e)
            })?;

        credit_balance(&txn, deal.id, amount).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, payment_id = %payment_id, "Failed to commit payment deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(payment_id = %payment_id, deal_id = %deal.id, %amount, "Payment deleted, balance restored");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentDeleted {
                    payment_id,
                    deal_id: deal.id,
                    amount,
                })
                .await
            {
                warn!(error = %e, payment_id = %payment_id, "Failed to send payment deleted event");
            }
        }

        Ok(())
    }

    /// Payments for a deal, newest first, annotated with recorder identity.
    #[instrument(skip(self), fields(company_id = company_id, deal_id = %deal_id))]
    pub async fn list_payments(
        &self,
        company_id: i64,
        deal_id: Uuid,
    ) -> Result<Vec<PaymentWithRecorder>, ServiceError> {
        let db = &*self.db_pool;

        find_tenant_deal(db, company_id, deal_id).await?;

        let rows = PaymentEntity::find()
            .filter(payment::Column::DealId.eq(deal_id))
            .order_by_desc(payment::Column::PaymentDate)
            .order_by_desc(payment::Column::CreatedAt)
            .find_also_related(EmployeeEntity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .map(|(payment, recorder)| PaymentWithRecorder {
                payment: model_to_response(payment),
                recorded_by_name: recorder.as_ref().map(|e| e.name.clone()),
                recorded_by_email: recorder.map(|e| e.email),
            })
            .collect())
    }
}

/// Loads a deal and enforces the tenant boundary: a deal that exists but
/// belongs to another company is reported as `Forbidden`, not `NotFound`.
pub(crate) async fn find_tenant_deal<C: ConnectionTrait>(
    conn: &C,
    company_id: i64,
    deal_id: Uuid,
) -> Result<DealModel, ServiceError> {
    let deal = DealEntity::find_by_id(deal_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Deal {} not found", deal_id)))?;

    if deal.company_id != company_id {
        warn!(deal_id = %deal_id, owner = deal.company_id, caller = company_id, "Cross-tenant deal access rejected");
        return Err(ServiceError::Forbidden(
            "Deal belongs to a different company".to_string(),
        ));
    }

    Ok(deal)
}

async fn ensure_employee<C: ConnectionTrait>(
    conn: &C,
    company_id: i64,
    employee_id: Uuid,
) -> Result<(), ServiceError> {
    EmployeeEntity::find_by_id(employee_id)
        .filter(employee::Column::CompanyId.eq(company_id))
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;
    Ok(())
}

/// Atomic conditional decrement: `balance = balance - amount` only when the
/// balance covers it. Zero rows touched means overdraw.
async fn debit_balance<C: ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
    amount: Decimal,
) -> Result<(), ServiceError> {
    let result = DealEntity::update_many()
        .col_expr(
            deal::Column::BalanceAmount,
            Expr::col(deal::Column::BalanceAmount).sub(amount),
        )
        .col_expr(deal::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(deal::Column::Id.eq(deal_id))
        .filter(deal::Column::BalanceAmount.gte(amount))
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::LedgerViolation(format!(
            "Payment of {} exceeds the deal's remaining balance",
            amount
        )));
    }
    Ok(())
}

/// Atomic increment used by deletion and downward edits.
async fn credit_balance<C: ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
    amount: Decimal,
) -> Result<(), ServiceError> {
    DealEntity::update_many()
        .col_expr(
            deal::Column::BalanceAmount,
            Expr::col(deal::Column::BalanceAmount).add(amount),
        )
        .col_expr(deal::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(deal::Column::Id.eq(deal_id))
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;
    Ok(())
}

/// Converts a payment model to response format
pub(crate) fn model_to_response(model: PaymentModel) -> PaymentResponse {
    PaymentResponse {
        id: model.id,
        deal_id: model.deal_id,
        amount: model.amount,
        payment_date: model.payment_date,
        payment_method: model.payment_method,
        remarks: model.remarks,
        created_by_id: model.created_by_id,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_accepts_every_wire_label() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::BankTransfer,
            PaymentMethod::Cheque,
            PaymentMethod::OnlinePayment,
            PaymentMethod::Card,
            PaymentMethod::Upi,
            PaymentMethod::Advance,
        ] {
            assert_eq!(PaymentMethod::parse(method.label()).unwrap(), method);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_accepts_aliases() {
        assert_eq!(PaymentMethod::parse("CASH").unwrap(), PaymentMethod::Cash);
        assert_eq!(
            PaymentMethod::parse("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(PaymentMethod::parse("check").unwrap(), PaymentMethod::Cheque);
        assert_eq!(PaymentMethod::parse("card").unwrap(), PaymentMethod::Card);
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert_matches!(
            PaymentMethod::parse("barter"),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            PaymentMethod::parse("  "),
            Err(ServiceError::ValidationError(_))
        );
    }
}
