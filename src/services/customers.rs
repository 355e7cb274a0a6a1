use crate::{
    db::DbPool,
    entities::customer::{
        self, ActiveModel as CustomerActiveModel, Entity as CustomerEntity,
        Model as CustomerModel,
    },
    entities::deal::{self, Entity as DealEntity},
    entities::payment::{self, Entity as PaymentEntity},
    entities::service_contract::{self, Entity as ServiceContractEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, IntoColumnRef, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Customer name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer directory for one tenant. Deleting a customer takes its deals,
/// their payments, and its service contracts down with it in one transaction.
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(company_id = company_id))]
    pub async fn create_customer(
        &self,
        company_id: i64,
        request: CreateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let model = CustomerActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = %model.id, "Customer created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerCreated(model.id)).await {
                warn!(error = %e, customer_id = %model.id, "Failed to send customer created event");
            }
        }

        Ok(model)
    }

    #[instrument(skip(self), fields(company_id = company_id, customer_id = %customer_id))]
    pub async fn get_customer(
        &self,
        company_id: i64,
        customer_id: Uuid,
    ) -> Result<CustomerModel, ServiceError> {
        let db = &*self.db_pool;
        find_tenant_customer(db, company_id, customer_id).await
    }

    #[instrument(skip(self, request), fields(company_id = company_id, customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        company_id: i64,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = find_tenant_customer(db, company_id, customer_id).await?;

        let mut active: CustomerActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, customer_id = %customer_id, "Failed to update customer");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerUpdated(updated.id)).await {
                warn!(error = %e, customer_id = %updated.id, "Failed to send customer updated event");
            }
        }

        Ok(updated)
    }

    /// Cascade delete: payments of the customer's deals, the deals, the AMS
    /// contracts, then the customer, all or nothing.
    #[instrument(skip(self), fields(company_id = company_id, customer_id = %customer_id))]
    pub async fn delete_customer(
        &self,
        company_id: i64,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for customer deletion");
            ServiceError::DatabaseError(e)
        })?;

        find_tenant_customer(&txn, company_id, customer_id).await?;

        let deal_ids: Vec<Uuid> = DealEntity::find()
            .select_only()
            .column(deal::Column::Id)
            .filter(deal::Column::CustomerId.eq(customer_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if !deal_ids.is_empty() {
            PaymentEntity::delete_many()
                .filter(payment::Column::DealId.is_in(deal_ids.clone()))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            DealEntity::delete_many()
                .filter(deal::Column::Id.is_in(deal_ids))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        ServiceContractEntity::delete_many()
            .filter(service_contract::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        CustomerEntity::delete_by_id(customer_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, customer_id = %customer_id, "Failed to commit customer deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = %customer_id, "Customer deleted with deals, payments and contracts");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CustomerDeleted(customer_id)).await {
                warn!(error = %e, customer_id = %customer_id, "Failed to send customer deleted event");
            }
        }

        Ok(())
    }

    /// Lists a tenant's customers with optional name/email search.
    #[instrument(skip(self), fields(company_id = company_id, page = page, per_page = per_page))]
    pub async fn list_customers(
        &self,
        company_id: i64,
        page: u64,
        per_page: u64,
        search: Option<&str>,
    ) -> Result<(Vec<CustomerModel>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = CustomerEntity::find()
            .filter(customer::Column::CompanyId.eq(company_id))
            .order_by_asc(customer::Column::Name);

        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ci_contains(
                        (customer::Entity, customer::Column::Name),
                        needle,
                    ))
                    .add(ci_contains(
                        (customer::Entity, customer::Column::Email),
                        needle,
                    )),
            );
        }

        let paginator = query.paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let customers = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((customers, total))
    }
}

pub(crate) async fn find_tenant_customer<C: sea_orm::ConnectionTrait>(
    conn: &C,
    company_id: i64,
    customer_id: Uuid,
) -> Result<CustomerModel, ServiceError> {
    let found = CustomerEntity::find_by_id(customer_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

    if found.company_id != company_id {
        warn!(customer_id = %customer_id, owner = found.company_id, caller = company_id, "Cross-tenant customer access rejected");
        return Err(ServiceError::Forbidden(
            "Customer belongs to a different company".to_string(),
        ));
    }

    Ok(found)
}

fn ci_contains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(format!("%{}%", needle.to_ascii_lowercase()))
}
