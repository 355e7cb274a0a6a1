use crate::{
    db::DbPool,
    entities::service_contract::{
        self, ActiveModel as ContractActiveModel, Entity as ContractEntity,
        Model as ContractModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::customers::find_tenant_customer,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateContractRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Product description is required"))]
    pub product: String,
    pub amount: Option<Decimal>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub visits_planned: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateContractRequest {
    #[validate(length(min = 1, max = 200, message = "Product description must not be empty"))]
    pub product: Option<String>,
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub visits_planned: Option<i32>,
    pub notes: Option<String>,
}

/// AMS (Annual Maintenance Service) contracts: recurring-visit service
/// agreements tied to a customer.
#[derive(Clone)]
pub struct ContractService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ContractService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(company_id = company_id, customer_id = %request.customer_id))]
    pub async fn create_contract(
        &self,
        company_id: i64,
        request: CreateContractRequest,
    ) -> Result<ContractModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.end_date < request.start_date {
            return Err(ServiceError::ValidationError(
                "Contract end date precedes its start date".to_string(),
            ));
        }

        let db = &*self.db_pool;
        find_tenant_customer(db, company_id, request.customer_id).await?;

        let model = ContractActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            customer_id: Set(request.customer_id),
            product: Set(request.product),
            amount: Set(request.amount),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            visits_planned: Set(request.visits_planned),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert service contract");
            ServiceError::DatabaseError(e)
        })?;

        info!(contract_id = %model.id, "Service contract created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::ServiceContractCreated(model.id))
                .await
            {
                warn!(error = %e, contract_id = %model.id, "Failed to send contract created event");
            }
        }

        Ok(model)
    }

    #[instrument(skip(self), fields(company_id = company_id, contract_id = %contract_id))]
    pub async fn get_contract(
        &self,
        company_id: i64,
        contract_id: Uuid,
    ) -> Result<ContractModel, ServiceError> {
        let db = &*self.db_pool;
        find_tenant_contract(db, company_id, contract_id).await
    }

    #[instrument(skip(self, request), fields(company_id = company_id, contract_id = %contract_id))]
    pub async fn update_contract(
        &self,
        company_id: i64,
        contract_id: Uuid,
        request: UpdateContractRequest,
    ) -> Result<ContractModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = find_tenant_contract(db, company_id, contract_id).await?;

        let start = request.start_date.unwrap_or(existing.start_date);
        let end = request.end_date.unwrap_or(existing.end_date);
        if end < start {
            return Err(ServiceError::ValidationError(
                "Contract end date precedes its start date".to_string(),
            ));
        }

        let mut active: ContractActiveModel = existing.into();
        if let Some(product) = request.product {
            active.product = Set(product);
        }
        if let Some(amount) = request.amount {
            active.amount = Set(Some(amount));
        }
        if let Some(start_date) = request.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = request.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(visits) = request.visits_planned {
            active.visits_planned = Set(visits);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, contract_id = %contract_id, "Failed to update service contract");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::ServiceContractUpdated(updated.id))
                .await
            {
                warn!(error = %e, contract_id = %updated.id, "Failed to send contract updated event");
            }
        }

        Ok(updated)
    }

    #[instrument(skip(self), fields(company_id = company_id, contract_id = %contract_id))]
    pub async fn delete_contract(
        &self,
        company_id: i64,
        contract_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        find_tenant_contract(db, company_id, contract_id).await?;

        ContractEntity::delete_by_id(contract_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, contract_id = %contract_id, "Failed to delete service contract");
                ServiceError::DatabaseError(e)
            })?;

        info!(contract_id = %contract_id, "Service contract deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::ServiceContractDeleted(contract_id))
                .await
            {
                warn!(error = %e, contract_id = %contract_id, "Failed to send contract deleted event");
            }
        }

        Ok(())
    }

    /// Lists a tenant's contracts, optionally narrowed to one customer.
    #[instrument(skip(self), fields(company_id = company_id, page = page, per_page = per_page))]
    pub async fn list_contracts(
        &self,
        company_id: i64,
        page: u64,
        per_page: u64,
        customer_id: Option<Uuid>,
    ) -> Result<(Vec<ContractModel>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = ContractEntity::find()
            .filter(service_contract::Column::CompanyId.eq(company_id))
            .order_by_desc(service_contract::Column::EndDate);

        if let Some(customer_id) = customer_id {
            query = query.filter(service_contract::Column::CustomerId.eq(customer_id));
        }

        let paginator = query.paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let contracts = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((contracts, total))
    }
}

async fn find_tenant_contract<C: sea_orm::ConnectionTrait>(
    conn: &C,
    company_id: i64,
    contract_id: Uuid,
) -> Result<ContractModel, ServiceError> {
    let found = ContractEntity::find_by_id(contract_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Service contract {} not found", contract_id))
        })?;

    if found.company_id != company_id {
        return Err(ServiceError::Forbidden(
            "Service contract belongs to a different company".to_string(),
        ));
    }

    Ok(found)
}
