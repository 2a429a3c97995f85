//! Recurring transaction entity - A template for periodic expenses.
//!
//! A recurring transaction names its category as free text rather than a
//! category FK: the name is resolved (and the category lazily created) each
//! time the recurrence engine materializes a real ledger entry. While the
//! item is `Active` its `next_due_date` only ever moves forward.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    /// Unique identifier for the recurring item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Couple the subscription belongs to
    pub couple_id: i64,
    /// Category name resolved at each materialization
    pub category_name: String,
    /// Amount charged per occurrence
    pub amount: f64,
    /// How often the item recurs
    pub frequency: Frequency,
    /// Next date the item falls due
    pub next_due_date: Date,
    /// Free-text description
    pub description: String,
    /// Current lifecycle status
    pub status: RecurringStatus,
    /// When the item was created
    pub created_at: DateTimeUtc,
}

/// Recurrence cadence of a recurring transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Frequency {
    /// Every 7 days
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    /// Every 14 days
    #[sea_orm(string_value = "Bi-weekly")]
    #[serde(rename = "Bi-weekly")]
    Biweekly,
    /// Same day next month, clamped to month end
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    /// Every 90 days
    #[sea_orm(string_value = "Quarterly")]
    Quarterly,
    /// Same month and day, next year
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

/// Lifecycle status of a recurring transaction.
///
/// `Active` and `Paused` toggle freely; `Cancelled` is terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum RecurringStatus {
    /// Due dates advance and materialize
    #[sea_orm(string_value = "Active")]
    Active,
    /// Temporarily suspended
    #[sea_orm(string_value = "Paused")]
    Paused,
    /// Permanently stopped
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Defines relationships between recurring transactions and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recurring item belongs to one couple
    #[sea_orm(
        belongs_to = "super::couple_pair::Entity",
        from = "Column::CoupleId",
        to = "super::couple_pair::Column::Id"
    )]
    Couple,
}

impl Related<super::couple_pair::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couple.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
