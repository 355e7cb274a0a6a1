use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single money transfer recorded against a deal's balance. `deal_id` is
/// immutable after insert; the owning deal's `balance_amount` moves in the
/// same transaction as every row change here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub deal_id: Uuid,

    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,

    /// Stored as the wire label, e.g. "Cash", "Bank Transfer", "Advance".
    pub payment_method: String,

    pub remarks: Option<String>,
    pub created_by_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deal::Entity",
        from = "Column::DealId",
        to = "super::deal::Column::Id"
    )]
    Deal,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::CreatedById",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
