use super::common::{PaginatedResponse, PaginationParams};
use crate::entities::customer::Model as Customer;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::customers::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::services::ledger_queries::CustomerRollup;
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerSearchParams {
    /// Case-insensitive substring over name and email
    pub search: Option<String>,
}

/// List customers for a tenant
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/customers",
    params(("company_id" = i64, Path, description = "Tenant identifier"), PaginationParams, CustomerSearchParams),
    responses((status = 200, description = "Page of customers")),
    tag = "Customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<CustomerSearchParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<Customer>>>, ServiceError> {
    let (customers, total) = state
        .services
        .customers
        .list_customers(
            company_id,
            pagination.page,
            pagination.per_page,
            filter.search.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        customers,
        pagination.page,
        pagination.per_page,
        total,
    ))))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/v1/{company_id}/customers",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 201, description = "Customer created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ServiceError> {
    let customer = state
        .services
        .customers
        .create_customer(company_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

/// Per-customer deal totals for the rollup view
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/customers/rollup",
    params(("company_id" = i64, Path, description = "Tenant identifier"), PaginationParams, CustomerSearchParams),
    responses((status = 200, description = "Customers with deal value and balance sums")),
    tag = "Customers"
)]
pub async fn customer_rollup(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<CustomerSearchParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerRollup>>>, ServiceError> {
    let (rollups, total) = state
        .services
        .ledger_queries
        .customer_rollup(
            company_id,
            pagination.page,
            pagination.per_page,
            filter.search.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        rollups,
        pagination.page,
        pagination.per_page,
        total,
    ))))
}

/// Fetch one customer
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/customers/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<Customer>>, ServiceError> {
    let customer = state.services.customers.get_customer(company_id, id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/v1/{company_id}/customers/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer updated"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ServiceError> {
    let customer = state
        .services
        .customers
        .update_customer(company_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Delete a customer, cascading to deals, payments and contracts
#[utoipa::path(
    delete,
    path = "/api/v1/{company_id}/customers/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer and dependents deleted"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.customers.delete_customer(company_id, id).await?;
    Ok(Json(ApiResponse::message("Customer deleted")))
}

/// Customer routes, nested under `/{company_id}/customers`
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/rollup", get(customer_rollup))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}
