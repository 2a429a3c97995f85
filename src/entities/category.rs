//! Category entity - A named, couple-scoped bucket for transactions.
//!
//! Category identity is entirely name-driven within a couple: the first
//! transaction naming a category creates it, and later writes naming the
//! same text resolve to the same row. A unique index on (couple_id, name)
//! backs the atomic insert-or-fetch in `core::category`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Couple this category belongs to
    pub couple_id: i64,
    /// Category name, unique within the couple
    pub name: String,
    /// Whether the category buckets income or expenses
    pub kind: CategoryKind,
}

/// Semantic use of a category, fixed at creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Buckets income transactions
    #[sea_orm(string_value = "income")]
    Income,
    /// Buckets expense transactions
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category belongs to one couple
    #[sea_orm(
        belongs_to = "super::couple_pair::Entity",
        from = "Column::CoupleId",
        to = "super::couple_pair::Column::Id"
    )]
    Couple,
    /// One category has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One category has many budgets (one per month)
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
}

impl Related<super::couple_pair::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couple.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
