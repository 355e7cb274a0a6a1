use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    entities::deal::{self, Entity as DealEntity},
    entities::payment::{self, Entity as PaymentEntity},
    errors::ServiceError,
    services::deals::{model_to_response as deal_to_response, DealResponse},
    services::payments::find_tenant_deal,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, IntoColumnRef, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, FromQueryResult, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Sort keys exposed by the deal listing. Client strings are parsed into this
/// set; nothing from the query string reaches query construction directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DealSortKey {
    #[default]
    DealNumber,
    DealValue,
    DealApprovalValue,
    BalanceAmount,
    CreatedAt,
}

impl DealSortKey {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "deal_number" | "dealid" => Ok(Self::DealNumber),
            "deal_value" => Ok(Self::DealValue),
            "deal_approval_value" => Ok(Self::DealApprovalValue),
            "balance_amount" => Ok(Self::BalanceAmount),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(ServiceError::ValidationError(format!(
                "invalid sort field: {}",
                other
            ))),
        }
    }

    fn column(self) -> deal::Column {
        match self {
            Self::DealNumber => deal::Column::DealNumber,
            Self::DealValue => deal::Column::DealValue,
            Self::DealApprovalValue => deal::Column::DealApprovalValue,
            Self::BalanceAmount => deal::Column::BalanceAmount,
            Self::CreatedAt => deal::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(ServiceError::ValidationError(format!(
                "invalid sort order: {}",
                other
            ))),
        }
    }
}

impl From<SortOrder> for Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Ascending => Order::Asc,
            SortOrder::Descending => Order::Desc,
        }
    }
}

/// Deal joined with a summary of its customer for list views.
#[derive(Debug, Serialize, Deserialize)]
pub struct DealWithCustomer {
    #[serde(flatten)]
    pub deal: DealResponse,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Per-customer aggregate across that customer's deals.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerRollup {
    pub customer_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub deal_count: u64,
    pub total_deal_value: Decimal,
    pub total_balance_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    pub id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub remarks: Option<String>,
    pub created_by_id: Option<Uuid>,
    /// Remaining balance immediately after this payment, replayed from the
    /// approved value in chronological order.
    pub balance_after: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentHistoryResponse {
    pub deal_id: Uuid,
    pub deal_number: String,
    pub deal_approval_value: Decimal,
    pub balance_amount: Decimal,
    /// Newest first.
    pub entries: Vec<PaymentHistoryEntry>,
}

#[derive(Debug, FromQueryResult)]
struct DealTotalsRow {
    customer_id: Uuid,
    deal_count: i64,
    total_deal_value: Option<Decimal>,
    total_balance_amount: Option<Decimal>,
}

/// Read-side projections over the ledger: deal listing, customer rollup, and
/// per-deal payment history.
#[derive(Clone)]
pub struct LedgerQueryService {
    db_pool: Arc<DbPool>,
}

impl LedgerQueryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists a tenant's deals with their customers. `search` matches the deal
    /// number, the customer name, and the requirement text, case-insensitive.
    #[instrument(skip(self), fields(company_id = company_id, page = page, per_page = per_page))]
    pub async fn list_deals(
        &self,
        company_id: i64,
        page: u64,
        per_page: u64,
        search: Option<&str>,
        sort_by: DealSortKey,
        sort_order: SortOrder,
    ) -> Result<(Vec<DealWithCustomer>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = DealEntity::find()
            .filter(deal::Column::CompanyId.eq(company_id))
            .find_also_related(CustomerEntity);

        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(ci_contains(
                        (deal::Entity, deal::Column::DealNumber),
                        needle,
                    ))
                    .add(ci_contains(
                        (deal::Entity, deal::Column::Requirement),
                        needle,
                    ))
                    .add(ci_contains(
                        (customer::Entity, customer::Column::Name),
                        needle,
                    )),
            );
        }

        query = query.order_by(sort_by.column(), sort_order.into());

        let paginator = query.paginate(db, per_page.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let rows = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let deals = rows
            .into_iter()
            .map(|(deal, customer)| DealWithCustomer {
                deal: deal_to_response(deal),
                customer_name: customer.as_ref().map(|c| c.name.clone()),
                customer_email: customer.and_then(|c| c.email),
            })
            .collect();

        Ok((deals, total))
    }

    /// Rolls up deal totals per customer for a tenant. Customers without
    /// deals appear with zero totals.
    #[instrument(skip(self), fields(company_id = company_id, page = page, per_page = per_page))]
    pub async fn customer_rollup(
        &self,
        company_id: i64,
        page: u64,
        per_page: u64,
        search: Option<&str>,
    ) -> Result<(Vec<CustomerRollup>, u64), ServiceError> {
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

        if customers.is_empty() {
            return Ok((Vec::new(), total));
        }

        let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
        let totals: Vec<DealTotalsRow> = DealEntity::find()
            .select_only()
            .column(deal::Column::CustomerId)
            .column_as(deal::Column::Id.count(), "deal_count")
            .column_as(deal::Column::DealValue.sum(), "total_deal_value")
            .column_as(deal::Column::BalanceAmount.sum(), "total_balance_amount")
            .filter(deal::Column::CustomerId.is_in(ids))
            .group_by(deal::Column::CustomerId)
            .into_model::<DealTotalsRow>()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let rollups = customers
            .into_iter()
            .map(|c| {
                let row = totals.iter().find(|t| t.customer_id == c.id);
                CustomerRollup {
                    customer_id: c.id,
                    name: c.name,
                    email: c.email,
                    deal_count: row.map(|t| t.deal_count.max(0) as u64).unwrap_or(0),
                    total_deal_value: row
                        .and_then(|t| t.total_deal_value)
                        .unwrap_or(Decimal::ZERO),
                    total_balance_amount: row
                        .and_then(|t| t.total_balance_amount)
                        .unwrap_or(Decimal::ZERO),
                }
            })
            .collect();

        Ok((rollups, total))
    }

    /// Replays a deal's payments chronologically from the approved value and
    /// returns them newest first with the balance after each entry. Doubles
    /// as a consistency cross-check against the stored balance.
    #[instrument(skip(self), fields(company_id = company_id, deal_id = %deal_id))]
    pub async fn payment_history(
        &self,
        company_id: i64,
        deal_id: Uuid,
    ) -> Result<PaymentHistoryResponse, ServiceError> {
        let db = &*self.db_pool;

        let deal = find_tenant_deal(db, company_id, deal_id).await?;

        let payments = PaymentEntity::find()
            .filter(payment::Column::DealId.eq(deal_id))
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let amounts: Vec<Decimal> = payments.iter().map(|p| p.amount).collect();
        let balances = running_balances(deal.deal_approval_value, &amounts);

        if let Some(last) = balances.last() {
            if *last != deal.balance_amount {
                warn!(
                    deal_id = %deal_id,
                    replayed = %last,
                    stored = %deal.balance_amount,
                    "Replayed ledger balance disagrees with stored balance"
                );
            }
        }

        let mut entries: Vec<PaymentHistoryEntry> = payments
            .into_iter()
            .zip(balances)
            .map(|(p, balance_after)| PaymentHistoryEntry {
                id: p.id,
                amount: p.amount,
                payment_date: p.payment_date,
                payment_method: p.payment_method,
                remarks: p.remarks,
                created_by_id: p.created_by_id,
                balance_after,
            })
            .collect();
        entries.reverse();

        Ok(PaymentHistoryResponse {
            deal_id: deal.id,
            deal_number: deal.deal_number,
            deal_approval_value: deal.deal_approval_value,
            balance_amount: deal.balance_amount,
            entries,
        })
    }
}

/// Case-insensitive substring match on a column.
fn ci_contains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(format!("%{}%", needle.to_ascii_lowercase()))
}

/// Balance after each payment when replayed chronologically from the
/// approved value.
fn running_balances(approval: Decimal, amounts: &[Decimal]) -> Vec<Decimal> {
    let mut running = approval;
    amounts
        .iter()
        .map(|amount| {
            running -= *amount;
            running
        })
        .collect()
}
