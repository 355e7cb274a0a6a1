use crate::{
    db::DbPool,
    entities::employee::{
        self, ActiveModel as EmployeeActiveModel, Entity as EmployeeEntity,
        Model as EmployeeModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 200, message = "Employee name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 200, message = "Employee name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Employee directory; payments reference these rows through
/// `created_by_id`.
#[derive(Clone)]
pub struct EmployeeService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl EmployeeService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(company_id = company_id))]
    pub async fn create_employee(
        &self,
        company_id: i64,
        request: CreateEmployeeRequest,
    ) -> Result<EmployeeModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let model = EmployeeActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(request.name),
            email: Set(request.email),
            role: Set(request.role),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert employee");
            ServiceError::DatabaseError(e)
        })?;

        info!(employee_id = %model.id, "Employee created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::EmployeeCreated(model.id)).await {
                warn!(error = %e, employee_id = %model.id, "Failed to send employee created event");
            }
        }

        Ok(model)
    }

    #[instrument(skip(self), fields(company_id = company_id, employee_id = %employee_id))]
    pub async fn get_employee(
        &self,
        company_id: i64,
        employee_id: Uuid,
    ) -> Result<EmployeeModel, ServiceError> {
        let db = &*self.db_pool;
        find_tenant_employee(db, company_id, employee_id).await
    }

    #[instrument(skip(self, request), fields(company_id = company_id, employee_id = %employee_id))]
    pub async fn update_employee(
        &self,
        company_id: i64,
        employee_id: Uuid,
        request: UpdateEmployeeRequest,
    ) -> Result<EmployeeModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let existing = find_tenant_employee(db, company_id, employee_id).await?;

        let mut active: EmployeeActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(role) = request.role {
            active.role = Set(Some(role));
        }

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, employee_id = %employee_id, "Failed to update employee");
            ServiceError::DatabaseError(e)
        })?;

        Ok(updated)
    }

    #[instrument(skip(self), fields(company_id = company_id, employee_id = %employee_id))]
    pub async fn delete_employee(
        &self,
        company_id: i64,
        employee_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        find_tenant_employee(db, company_id, employee_id).await?;

        EmployeeEntity::delete_by_id(employee_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = %employee_id, "Failed to delete employee");
                ServiceError::DatabaseError(e)
            })?;

        info!(employee_id = %employee_id, "Employee deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::EmployeeDeleted(employee_id)).await {
                warn!(error = %e, employee_id = %employee_id, "Failed to send employee deleted event");
            }
        }

        Ok(())
    }

    #[instrument(skip(self), fields(company_id = company_id, page = page, per_page = per_page))]
    pub async fn list_employees(
        &self,
        company_id: i64,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<EmployeeModel>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = EmployeeEntity::find()
            .filter(employee::Column::CompanyId.eq(company_id))
            .order_by_asc(employee::Column::Name)
            .paginate(db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let employees = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((employees, total))
    }
}

async fn find_tenant_employee<C: sea_orm::ConnectionTrait>(
    conn: &C,
    company_id: i64,
    employee_id: Uuid,
) -> Result<EmployeeModel, ServiceError> {
    let found = EmployeeEntity::find_by_id(employee_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", employee_id)))?;

    if found.company_id != company_id {
        return Err(ServiceError::Forbidden(
            "Employee belongs to a different company".to_string(),
        ));
    }

    Ok(found)
}
