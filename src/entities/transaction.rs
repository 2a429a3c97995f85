//! Transaction entity - A single income or expense entry in the shared ledger.
//!
//! Each transaction is scoped to a couple and resolved to a category at
//! write time. `user_id` records which member entered it; rows materialized
//! by the recurrence engine carry `None` there. The `date` column is a typed
//! calendar date (stored as `YYYY-MM-DD` text in SQLite), so period queries
//! compare date ranges rather than string prefixes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Couple whose ledger this entry belongs to
    pub couple_id: i64,
    /// Member who recorded it; `None` for recurrence-engine materializations
    pub user_id: Option<i64>,
    /// Category the entry was resolved to at write time
    pub category_id: i64,
    /// Amount, always positive; direction comes from `kind`
    pub amount: f64,
    /// Free-text description
    pub description: String,
    /// Calendar date of the entry
    pub date: Date,
    /// Whether the entry is income or an expense
    pub kind: TransactionKind,
}

/// Direction of a ledger entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TransactionKind {
    /// Money coming in
    #[sea_orm(string_value = "Income")]
    Income,
    /// Money going out
    #[sea_orm(string_value = "Expense")]
    Expense,
}

impl TransactionKind {
    /// The category kind a transaction of this kind must resolve to.
    #[must_use]
    pub fn category_kind(self) -> super::category::CategoryKind {
        match self {
            TransactionKind::Income => super::category::CategoryKind::Income,
            TransactionKind::Expense => super::category::CategoryKind::Expense,
        }
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one couple
    #[sea_orm(
        belongs_to = "super::couple_pair::Entity",
        from = "Column::CoupleId",
        to = "super::couple_pair::Column::Id"
    )]
    Couple,
    /// Each transaction resolves to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Recording member, absent for system-generated rows
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::couple_pair::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couple.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
