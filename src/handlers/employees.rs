use super::common::{PaginatedResponse, PaginationParams};
use crate::entities::employee::Model as Employee;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::employees::{CreateEmployeeRequest, UpdateEmployeeRequest};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use uuid::Uuid;

/// List employees for a tenant
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/employees",
    params(("company_id" = i64, Path, description = "Tenant identifier"), PaginationParams),
    responses((status = 200, description = "Page of employees")),
    tag = "Employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<Employee>>>, ServiceError> {
    let (employees, total) = state
        .services
        .employees
        .list_employees(company_id, pagination.page, pagination.per_page)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        employees,
        pagination.page,
        pagination.per_page,
        total,
    ))))
}

/// Create an employee
#[utoipa::path(
    post,
    path = "/api/v1/{company_id}/employees",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 201, description = "Employee created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Employee>>), ServiceError> {
    let employee = state
        .services
        .employees
        .create_employee(company_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

/// Fetch one employee
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/employees/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee"),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<Employee>>, ServiceError> {
    let employee = state.services.employees.get_employee(company_id, id).await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// Update an employee
#[utoipa::path(
    put,
    path = "/api/v1/{company_id}/employees/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee updated"),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
    Json(request): Json<UpdateEmployeeRequest>,
) -> Result<Json<ApiResponse<Employee>>, ServiceError> {
    let employee = state
        .services
        .employees
        .update_employee(company_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// Delete an employee
#[utoipa::path(
    delete,
    path = "/api/v1/{company_id}/employees/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deleted"),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.employees.delete_employee(company_id, id).await?;
    Ok(Json(ApiResponse::message("Employee deleted")))
}

/// Employee routes, nested under `/{company_id}/employees`
pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}
