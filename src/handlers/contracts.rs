use super::common::{PaginatedResponse, PaginationParams};
use crate::entities::service_contract::Model as ServiceContract;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::contracts::{CreateContractRequest, UpdateContractRequest};
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
pub struct ContractFilterParams {
    /// Narrow the listing to one customer
    pub customer_id: Option<Uuid>,
}

/// List AMS contracts for a tenant
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/contracts",
    params(("company_id" = i64, Path, description = "Tenant identifier"), PaginationParams, ContractFilterParams),
    responses((status = 200, description = "Page of service contracts")),
    tag = "Contracts"
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ContractFilterParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<ServiceContract>>>, ServiceError> {
    let (contracts, total) = state
        .services
        .contracts
        .list_contracts(
            company_id,
            pagination.page,
            pagination.per_page,
            filter.customer_id,
        )
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        contracts,
        pagination.page,
        pagination.per_page,
        total,
    ))))
}

/// Create an AMS contract
#[utoipa::path(
    post,
    path = "/api/v1/{company_id}/contracts",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 201, description = "Contract created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Contracts"
)]
pub async fn create_contract(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceContract>>), ServiceError> {
    let contract = state
        .services
        .contracts
        .create_contract(company_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(contract))))
}

/// Fetch one AMS contract
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/contracts/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Contract ID")
    ),
    responses(
        (status = 200, description = "Contract"),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Contracts"
)]
pub async fn get_contract(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<ServiceContract>>, ServiceError> {
    let contract = state.services.contracts.get_contract(company_id, id).await?;
    Ok(Json(ApiResponse::success(contract)))
}

/// Update an AMS contract
#[utoipa::path(
    put,
    path = "/api/v1/{company_id}/contracts/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Contract ID")
    ),
    responses(
        (status = 200, description = "Contract updated"),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Contracts"
)]
pub async fn update_contract(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
    Json(request): Json<UpdateContractRequest>,
) -> Result<Json<ApiResponse<ServiceContract>>, ServiceError> {
    let contract = state
        .services
        .contracts
        .update_contract(company_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(contract)))
}

/// Delete an AMS contract
#[utoipa::path(
    delete,
    path = "/api/v1/{company_id}/contracts/{id}",
    params(
        ("company_id" = i64, Path, description = "Tenant identifier"),
        ("id" = Uuid, Path, description = "Contract ID")
    ),
    responses(
        (status = 200, description = "Contract deleted"),
        (status = 404, description = "Contract not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Contracts"
)]
pub async fn delete_contract(
    State(state): State<AppState>,
    Path((company_id, id)): Path<(i64, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.contracts.delete_contract(company_id, id).await?;
    Ok(Json(ApiResponse::message("Service contract deleted")))
}

/// Contract routes, nested under `/{company_id}/contracts`
pub fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contracts).post(create_contract))
        .route(
            "/:id",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
}
