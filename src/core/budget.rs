//! Budget business logic - monthly planned-spend ceilings per category.
//!
//! Budgets upsert on (couple, category, `YYYY-MM`): saving the same key
//! twice updates the planned amount in place. The budget-vs-actual view
//! reports every expense category the couple has, whether or not it was
//! budgeted or spent on that month.

use crate::{
    entities::{
        Budget, Category, CategoryKind, Transaction, TransactionKind, budget, category,
        transaction,
    },
    errors::{Error, Result},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::collections::HashMap;

/// A budget row joined with its category name.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct BudgetLine {
    /// Budget row id
    pub id: i64,
    /// Category the ceiling applies to
    pub category_name: String,
    /// Planned amount for the month
    pub planned_amount: f64,
    /// Month key in `YYYY-MM` form
    pub month_year: String,
}

/// Planned vs actual spend for one expense category in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetComparison {
    /// Category name
    pub category_name: String,
    /// Planned amount, 0 when no budget was set
    pub budgeted: f64,
    /// Summed expense amount, 0 when nothing was spent
    pub actual: f64,
}

/// Creates or updates the budget for a category in a given month.
///
/// The category must already exist for the couple (at least one transaction
/// has named it); budgets never create categories. Saving an existing
/// (couple, category, month) key replaces the planned amount.
pub async fn upsert_budget(
    db: &DatabaseConnection,
    couple_id: i64,
    category_name: &str,
    planned_amount: f64,
    month: u32,
    year: i32,
) -> Result<budget::Model> {
    if planned_amount < 0.0 || !planned_amount.is_finite() {
        return Err(Error::InvalidAmount {
            amount: planned_amount,
        });
    }
    let month_year = super::month_year_key(year, month)?;

    let category = super::category::get_category(db, couple_id, category_name.trim())
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: category_name.trim().to_string(),
        })?;

    let row = budget::ActiveModel {
        couple_id: Set(couple_id),
        category_id: Set(category.id),
        planned_amount: Set(planned_amount),
        month_year: Set(month_year.clone()),
        ..Default::default()
    };
    Budget::insert(row)
        .on_conflict(
            OnConflict::columns([
                budget::Column::CoupleId,
                budget::Column::CategoryId,
                budget::Column::MonthYear,
            ])
            .update_column(budget::Column::PlannedAmount)
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Budget::find()
        .filter(budget::Column::CoupleId.eq(couple_id))
        .filter(budget::Column::CategoryId.eq(category.id))
        .filter(budget::Column::MonthYear.eq(month_year.clone()))
        .one(db)
        .await?
        .ok_or_else(|| {
            Error::Database(sea_orm::DbErr::RecordNotFound(format!(
                "budget {couple_id}/{}/{month_year}",
                category.id
            )))
        })
}

/// Lists a month's budgets with their category names, alphabetically.
pub async fn list_budgets(
    db: &DatabaseConnection,
    couple_id: i64,
    month: u32,
    year: i32,
) -> Result<Vec<BudgetLine>> {
    let month_year = super::month_year_key(year, month)?;

    Budget::find()
        .join(JoinType::InnerJoin, budget::Relation::Category.def())
        .select_only()
        .column(budget::Column::Id)
        .column_as(category::Column::Name, "category_name")
        .column(budget::Column::PlannedAmount)
        .column(budget::Column::MonthYear)
        .filter(budget::Column::CoupleId.eq(couple_id))
        .filter(budget::Column::MonthYear.eq(month_year))
        .order_by_asc(category::Column::Name)
        .into_model::<BudgetLine>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Budget vs actual spending for every expense category of the couple.
///
/// Categories with no budget or no spend for the month still appear, with
/// zeros, so the caller sees the full picture.
pub async fn budget_vs_actual(
    db: &DatabaseConnection,
    couple_id: i64,
    month: u32,
    year: i32,
) -> Result<Vec<BudgetComparison>> {
    #[derive(FromQueryResult)]
    struct SpendRow {
        category_id: i64,
        total: f64,
    }

    let (start, end) = super::month_bounds(year, month)?;
    let month_year = super::month_year_key(year, month)?;

    let categories = Category::find()
        .filter(category::Column::CoupleId.eq(couple_id))
        .filter(category::Column::Kind.eq(CategoryKind::Expense))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;

    let budgets: HashMap<i64, f64> = Budget::find()
        .filter(budget::Column::CoupleId.eq(couple_id))
        .filter(budget::Column::MonthYear.eq(month_year))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.category_id, b.planned_amount))
        .collect();

    let spent: HashMap<i64, f64> = Transaction::find()
        .select_only()
        .column(transaction::Column::CategoryId)
        .column_as(transaction::Column::Amount.sum(), "total")
        .filter(transaction::Column::CoupleId.eq(couple_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .group_by(transaction::Column::CategoryId)
        .into_model::<SpendRow>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.category_id, row.total))
        .collect();

    Ok(categories
        .into_iter()
        .map(|cat| BudgetComparison {
            budgeted: budgets.get(&cat.id).copied().unwrap_or(0.0),
            actual: spent.get(&cat.id).copied().unwrap_or(0.0),
            category_name: cat.name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::transaction::record_transaction;
    use crate::test_utils::*;
    use chrono::NaiveDate;
    use sea_orm::PaginatorTrait;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_budget_requires_category() -> Result<()> {
        let (db, _alice, _bob, pair) = setup_paired_couple().await?;

        let result = upsert_budget(&db, pair.id, "Groceries", 400.0, 6, 2024).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_budget_insert_then_update() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            50.0,
            "Groceries",
            "shop",
            date(2024, 6, 1),
            crate::entities::TransactionKind::Expense,
        )
        .await?;

        let created = upsert_budget(&db, pair.id, "Groceries", 400.0, 6, 2024).await?;
        assert_eq!(created.planned_amount, 400.0);
        assert_eq!(created.month_year, "2024-06");

        let updated = upsert_budget(&db, pair.id, "Groceries", 450.0, 6, 2024).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.planned_amount, 450.0);
        assert_eq!(Budget::find().count(&db).await?, 1);

        // A different month is its own row
        let july = upsert_budget(&db, pair.id, "Groceries", 500.0, 7, 2024).await?;
        assert_ne!(july.id, created.id);
        assert_eq!(Budget::find().count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_budget_rejects_bad_amounts() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            50.0,
            "Groceries",
            "shop",
            date(2024, 6, 1),
            crate::entities::TransactionKind::Expense,
        )
        .await?;

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let result = upsert_budget(&db, pair.id, "Groceries", bad, 6, 2024).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
        // Zero is a valid ceiling
        assert!(upsert_budget(&db, pair.id, "Groceries", 0.0, 6, 2024).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_budgets_joins_category_names() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;
        let kind = crate::entities::TransactionKind::Expense;
        record_transaction(&db, alice.id, pair.id, 10.0, "Utilities", "u", date(2024, 6, 1), kind)
            .await?;
        record_transaction(&db, alice.id, pair.id, 10.0, "Groceries", "g", date(2024, 6, 1), kind)
            .await?;

        upsert_budget(&db, pair.id, "Utilities", 120.0, 6, 2024).await?;
        upsert_budget(&db, pair.id, "Groceries", 400.0, 6, 2024).await?;
        upsert_budget(&db, pair.id, "Groceries", 999.0, 7, 2024).await?;

        let june = list_budgets(&db, pair.id, 6, 2024).await?;
        assert_eq!(june.len(), 2);
        assert_eq!(june[0].category_name, "Groceries");
        assert_eq!(june[0].planned_amount, 400.0);
        assert_eq!(june[1].category_name, "Utilities");
        assert_eq!(june[1].planned_amount, 120.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_budget_vs_actual_includes_idle_categories() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;
        let kind = crate::entities::TransactionKind::Expense;

        // "Dining" gets a budget but no June spend; "Groceries" both;
        // "Utilities" spend but no budget; "Salary" is income and excluded.
        record_transaction(&db, alice.id, pair.id, 30.0, "Dining", "d", date(2024, 5, 20), kind)
            .await?;
        record_transaction(&db, alice.id, pair.id, 80.0, "Groceries", "g", date(2024, 6, 10), kind)
            .await?;
        record_transaction(&db, alice.id, pair.id, 20.0, "Groceries", "g2", date(2024, 6, 12), kind)
            .await?;
        record_transaction(&db, alice.id, pair.id, 60.0, "Utilities", "u", date(2024, 6, 15), kind)
            .await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            3000.0,
            "Salary",
            "s",
            date(2024, 6, 1),
            crate::entities::TransactionKind::Income,
        )
        .await?;

        upsert_budget(&db, pair.id, "Dining", 150.0, 6, 2024).await?;
        upsert_budget(&db, pair.id, "Groceries", 400.0, 6, 2024).await?;

        let rows = budget_vs_actual(&db, pair.id, 6, 2024).await?;
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].category_name, "Dining");
        assert_eq!(rows[0].budgeted, 150.0);
        assert_eq!(rows[0].actual, 0.0);

        assert_eq!(rows[1].category_name, "Groceries");
        assert_eq!(rows[1].budgeted, 400.0);
        assert_eq!(rows[1].actual, 100.0);

        assert_eq!(rows[2].category_name, "Utilities");
        assert_eq!(rows[2].budgeted, 0.0);
        assert_eq!(rows[2].actual, 60.0);

        Ok(())
    }
}
