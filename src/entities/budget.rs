//! Budget entity - A planned-spend ceiling for one category in one month.
//!
//! Budgets are keyed by (couple, category, `YYYY-MM`); a unique index on
//! that triple backs the upsert in `core::budget`, so at most one row exists
//! per key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Couple the budget belongs to
    pub couple_id: i64,
    /// Category the ceiling applies to
    pub category_id: i64,
    /// Planned amount for the month
    pub planned_amount: f64,
    /// Month key in `YYYY-MM` form
    pub month_year: String,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget belongs to one couple
    #[sea_orm(
        belongs_to = "super::couple_pair::Entity",
        from = "Column::CoupleId",
        to = "super::couple_pair::Column::Id"
    )]
    Couple,
    /// Each budget targets one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
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

impl ActiveModelBehavior for ActiveModel {}
