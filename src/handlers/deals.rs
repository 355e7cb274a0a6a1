use super::common::PaginatedResponse;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::deals::{CreateDealRequest, DealResponse, UpdateDealRequest};
use crate::services::ledger_queries::{
    DealSortKey, DealWithCustomer, PaymentHistoryResponse, SortOrder,
};
use crate::services::payments::{
    PaymentResponse, PaymentWithRecorder, RecordPaymentRequest, UpdatePaymentRequest,
};
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
pub struct DealListParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Case-insensitive substring over deal number, customer name, requirement
    pub search: Option<String>,
    /// One of: deal_number, deal_value, deal_approval_value, balance_amount, created_at
    pub sort_by: Option<String>,
    /// "asc" (default) or "desc"
    pub sort_order: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DealPaymentsParams {
    pub deal_id: Uuid,
}

/// Delete bodies carry the target id, mirroring the update surface.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DeleteByIdBody {
    pub id: Uuid,
}

// Handler functions

/// List deals with search, sort and pagination
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/deals",
    params(("company_id" = i64, Path, description = "Tenant identifier"), DealListParams),
    responses(
        (status = 200, description = "Page of deals with customers"),
        (status = 400, description = "Invalid sort field or order", body = crate::errors::ErrorResponse)
    ),
    tag = "Deals"
)]
pub async fn list_deals(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(params): Query<DealListParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<DealWithCustomer>>>, ServiceError> {
    let sort_by = DealSortKey::parse(params.sort_by.as_deref().unwrap_or_default())?;
    let sort_order = SortOrder::parse(params.sort_order.as_deref().unwrap_or_default())?;

    let page = params.page;
    let per_page = params.per_page;

    let (deals, total) = state
        .services
        .ledger_queries
        .list_deals(
            company_id,
            page,
            per_page,
            params.search.as_deref(),
            sort_by,
            sort_order,
        )
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        deals, page, per_page, total,
    ))))
}

/// Create a deal; an advance payment greater than zero opens its ledger
#[utoipa::path(
    post,
    path = "/api/v1/{company_id}/deals",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 201, description = "Deal created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Deals"
)]
pub async fn create_deal(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DealResponse>>), ServiceError> {
    let deal = state.services.deals.create_deal(company_id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(deal))))
}

/// Update a deal; the balance is recomputed against recorded payments
#[utoipa::path(
    put,
    path = "/api/v1/{company_id}/deals",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Deal updated"),
        (status = 403, description = "Cross-tenant access", body = crate::errors::ErrorResponse),
        (status = 404, description = "Deal not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Deals"
)]
pub async fn update_deal(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<UpdateDealRequest>,
) -> Result<Json<ApiResponse<DealResponse>>, ServiceError> {
    let deal = state.services.deals.update_deal(company_id, request).await?;
    Ok(Json(ApiResponse::success(deal)))
}

/// Delete a deal together with its payments
#[utoipa::path(
    delete,
    path = "/api/v1/{company_id}/deals",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    request_body = DeleteByIdBody,
    responses(
        (status = 200, description = "Deal deleted"),
        (status = 404, description = "Deal not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Deals"
)]
pub async fn delete_deal(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(body): Json<DeleteByIdBody>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.deals.delete_deal(company_id, body.id).await?;
    Ok(Json(ApiResponse::message("Deal deleted")))
}

/// List payments for a deal, newest first, with recorder identity
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/deals/payments",
    params(("company_id" = i64, Path, description = "Tenant identifier"), DealPaymentsParams),
    responses(
        (status = 200, description = "Payments for the deal"),
        (status = 403, description = "Cross-tenant access", body = crate::errors::ErrorResponse),
        (status = 404, description = "Deal not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(params): Query<DealPaymentsParams>,
) -> Result<Json<ApiResponse<Vec<PaymentWithRecorder>>>, ServiceError> {
    let payments = state
        .services
        .payments
        .list_payments(company_id, params.deal_id)
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

/// Record a payment against a deal
#[utoipa::path(
    post,
    path = "/api/v1/{company_id}/deals/payments",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 201, description = "Payment recorded, balance decremented"),
        (status = 400, description = "Validation failure or overdraw", body = crate::errors::ErrorResponse),
        (status = 404, description = "Deal or employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ServiceError> {
    let payment = state
        .services
        .payments
        .record_payment(company_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payment))))
}

/// Update a payment; the deal balance moves by the amount delta
#[utoipa::path(
    put,
    path = "/api/v1/{company_id}/deals/payments",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Payment updated"),
        (status = 400, description = "Validation failure or overdraw", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    let payment = state
        .services
        .payments
        .update_payment(company_id, request)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// Delete a payment and restore the deal balance
#[utoipa::path(
    delete,
    path = "/api/v1/{company_id}/deals/payments",
    params(("company_id" = i64, Path, description = "Tenant identifier")),
    request_body = DeleteByIdBody,
    responses(
        (status = 200, description = "Payment deleted, balance restored"),
        (status = 403, description = "Cross-tenant access", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(body): Json<DeleteByIdBody>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state
        .services
        .payments
        .delete_payment(company_id, body.id)
        .await?;
    Ok(Json(ApiResponse::message("Payment deleted")))
}

/// Payment history with a replayed running balance, newest first
#[utoipa::path(
    get,
    path = "/api/v1/{company_id}/deals/payments/history",
    params(("company_id" = i64, Path, description = "Tenant identifier"), DealPaymentsParams),
    responses(
        (status = 200, description = "Chronological ledger replay"),
        (status = 404, description = "Deal not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_history(
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Query(params): Query<DealPaymentsParams>,
) -> Result<Json<ApiResponse<PaymentHistoryResponse>>, ServiceError> {
    let history = state
        .services
        .ledger_queries
        .payment_history(company_id, params.deal_id)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

/// Deal and payment routes, nested under `/{company_id}/deals`
pub fn deal_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_deals)
                .post(create_deal)
                .put(update_deal)
                .delete(delete_deal),
        )
        .route(
            "/payments",
            get(list_payments)
                .post(record_payment)
                .put(update_payment)
                .delete(delete_payment),
        )
        .route("/payments/history", get(payment_history))
}
