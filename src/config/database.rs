//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. On top of the generated tables this module creates the unique
//! indexes that back upsert semantics: one on (couple_id, name) for
//! categories (closing the create-on-write race) and one on
//! (couple_id, category_id, month_year) for budgets.

use crate::entities::{
    Budget, Category, CouplePair, PairingInvitation, RecurringTransaction, Transaction, User,
    budget, category,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database named by `url`.
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    Database::connect(url).await.map_err(Into::into)
}

/// Creates all tables and unique indexes from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut invitation_table = schema.create_table_from_entity(PairingInvitation);
    let mut couple_table = schema.create_table_from_entity(CouplePair);
    let mut category_table = schema.create_table_from_entity(Category);
    let mut transaction_table = schema.create_table_from_entity(Transaction);
    let mut budget_table = schema.create_table_from_entity(Budget);
    let mut recurring_table = schema.create_table_from_entity(RecurringTransaction);

    db.execute(builder.build(user_table.if_not_exists())).await?;
    db.execute(builder.build(invitation_table.if_not_exists()))
        .await?;
    db.execute(builder.build(couple_table.if_not_exists())).await?;
    db.execute(builder.build(category_table.if_not_exists()))
        .await?;
    db.execute(builder.build(transaction_table.if_not_exists()))
        .await?;
    db.execute(builder.build(budget_table.if_not_exists())).await?;
    db.execute(builder.build(recurring_table.if_not_exists()))
        .await?;

    // Upsert targets; SQLite requires a unique index for ON CONFLICT.
    let category_name_idx = Index::create()
        .name("idx-categories-couple-name")
        .table(Category)
        .col(category::Column::CoupleId)
        .col(category::Column::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    let budget_key_idx = Index::create()
        .name("idx-budgets-couple-category-month")
        .table(Budget)
        .col(budget::Column::CoupleId)
        .col(budget::Column::CategoryId)
        .col(budget::Column::MonthYear)
        .unique()
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&category_name_idx)).await?;
    db.execute(builder.build(&budget_key_idx)).await?;

    Ok(())
}
