//! Couple pair entity - The shared-ledger unit formed by two paired users.
//!
//! The pair is unordered: `user1_id`/`user2_id` carry no meaning beyond who
//! sent and who accepted the invitation, and every query treats them
//! symmetrically. All financial entities (categories, transactions, budgets,
//! recurring transactions) are scoped to a pair and cascade with it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Couple pair database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "couple_pairs")]
pub struct Model {
    /// Unique identifier for the couple
    #[sea_orm(primary_key)]
    pub id: i64,
    /// One member (the invitation sender)
    pub user1_id: i64,
    /// The other member (the invitation receiver)
    pub user2_id: i64,
    /// Display name for the couple
    pub couple_name: String,
    /// When the pair was formed
    pub created_at: DateTimeUtc,
}

/// Financial entities owned by the pair.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Categories scoped to this couple
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
    /// Transactions scoped to this couple
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Budgets scoped to this couple
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
    /// Recurring transactions scoped to this couple
    #[sea_orm(has_many = "super::recurring_transaction::Entity")]
    RecurringTransactions,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
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

impl Related<super::recurring_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
