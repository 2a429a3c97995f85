//! Transaction business logic - recording, listing, editing and period
//! aggregates over the shared ledger.
//!
//! Every write resolves its category by name (creating it on first use) in
//! the same database transaction as the ledger insert, so a failure leaves
//! neither half behind. Amounts are always positive; direction comes from
//! the transaction kind, which must agree with the category's kind.

use crate::{
    entities::{Category, Transaction, TransactionKind, category, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set, TransactionTrait,
};

/// A ledger entry joined with the name of its category.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The transaction row
    pub transaction: transaction::Model,
    /// Name of the category it resolved to
    pub category_name: String,
}

/// One (category, direction) aggregate for a month.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct CategorySummaryRow {
    /// Category name
    pub category_name: String,
    /// Whether the rows summed were income or expenses
    pub kind: TransactionKind,
    /// Summed amount
    pub total: f64,
}

/// Income and expense sums for one month.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyTotals {
    /// Summed income amounts
    pub income: f64,
    /// Summed expense amounts
    pub expense: f64,
}

/// Records a transaction for a couple, resolving the category on the way.
///
/// The amount must be positive and finite. If no category named
/// `category_name` exists for the couple one is created with the kind
/// implied by `kind`; an existing category of the opposite kind is an
/// input error.
#[allow(clippy::too_many_arguments)]
pub async fn record_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    couple_id: i64,
    amount: f64,
    category_name: &str,
    description: &str,
    date: NaiveDate,
    kind: TransactionKind,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;
    let created = record_with_conn(
        &txn,
        Some(user_id),
        couple_id,
        amount,
        category_name,
        description,
        date,
        kind,
    )
    .await?;
    txn.commit().await?;
    Ok(created)
}

/// Writes one ledger row inside a caller-supplied transaction scope.
///
/// `user_id` is `None` for rows materialized by the recurrence engine.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn record_with_conn<C>(
    conn: &C,
    user_id: Option<i64>,
    couple_id: i64,
    amount: f64,
    category_name: &str,
    description: &str,
    date: NaiveDate,
    kind: TransactionKind,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;
    let category = resolve_category(conn, couple_id, category_name, kind).await?;

    let entry = transaction::ActiveModel {
        couple_id: Set(couple_id),
        user_id: Set(user_id),
        category_id: Set(category.id),
        amount: Set(amount),
        description: Set(description.to_string()),
        date: Set(date),
        kind: Set(kind),
        ..Default::default()
    };
    entry.insert(conn).await.map_err(Into::into)
}

/// Lists a couple's transactions, optionally filtered to one member,
/// newest date first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    couple_id: i64,
    user_filter: Option<i64>,
) -> Result<Vec<LedgerEntry>> {
    let mut query = Transaction::find()
        .find_also_related(Category)
        .filter(transaction::Column::CoupleId.eq(couple_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id);
    if let Some(user_id) = user_filter {
        query = query.filter(transaction::Column::UserId.eq(user_id));
    }

    let rows = query.all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(entry, category)| LedgerEntry {
            category_name: category.map(|c| c.name).unwrap_or_default(),
            transaction: entry,
        })
        .collect())
}

/// Rewrites a transaction the acting user owns.
///
/// The category is re-resolved from `category_name`, so an edit can move
/// the entry to a different (possibly new) category.
#[allow(clippy::too_many_arguments)]
pub async fn edit_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
    couple_id: i64,
    amount: f64,
    category_name: &str,
    description: &str,
    date: NaiveDate,
    kind: TransactionKind,
) -> Result<transaction::Model> {
    validate_amount(amount)?;
    let txn = db.begin().await?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .filter(|entry| entry.couple_id == couple_id)
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    if existing.user_id != Some(user_id) {
        return Err(Error::unauthorized(
            "Only the user who recorded a transaction can edit it",
        ));
    }

    let category = resolve_category(&txn, couple_id, category_name, kind).await?;

    let mut active: transaction::ActiveModel = existing.into();
    active.amount = Set(amount);
    active.category_id = Set(category.id);
    active.description = Set(description.to_string());
    active.date = Set(date);
    active.kind = Set(kind);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a transaction the acting user owns.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let existing = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    if existing.user_id != Some(user_id) {
        return Err(Error::unauthorized(
            "Only the user who recorded a transaction can delete it",
        ));
    }
    existing.delete(db).await?;
    Ok(())
}

/// Sums a month's activity per (category, kind), alphabetically by name.
pub async fn category_summary(
    db: &DatabaseConnection,
    couple_id: i64,
    month: u32,
    year: i32,
) -> Result<Vec<CategorySummaryRow>> {
    let (start, end) = super::month_bounds(year, month)?;

    Transaction::find()
        .join(JoinType::InnerJoin, transaction::Relation::Category.def())
        .select_only()
        .column_as(category::Column::Name, "category_name")
        .column(transaction::Column::Kind)
        .column_as(transaction::Column::Amount.sum(), "total")
        .filter(transaction::Column::CoupleId.eq(couple_id))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .group_by(category::Column::Name)
        .group_by(transaction::Column::Kind)
        .order_by_asc(category::Column::Name)
        .into_model::<CategorySummaryRow>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total income and expenses for one month.
pub async fn monthly_total(
    db: &DatabaseConnection,
    couple_id: i64,
    month: u32,
    year: i32,
) -> Result<MonthlyTotals> {
    #[derive(FromQueryResult)]
    struct KindTotal {
        kind: TransactionKind,
        total: f64,
    }

    let (start, end) = super::month_bounds(year, month)?;
    let rows = Transaction::find()
        .select_only()
        .column(transaction::Column::Kind)
        .column_as(transaction::Column::Amount.sum(), "total")
        .filter(transaction::Column::CoupleId.eq(couple_id))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .group_by(transaction::Column::Kind)
        .into_model::<KindTotal>()
        .all(db)
        .await?;

    let mut totals = MonthlyTotals::default();
    for row in rows {
        match row.kind {
            TransactionKind::Income => totals.income = row.total,
            TransactionKind::Expense => totals.expense = row.total,
        }
    }
    Ok(totals)
}

pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Resolves (or lazily creates) the category and checks kind consistency.
async fn resolve_category<C>(
    conn: &C,
    couple_id: i64,
    name: &str,
    kind: TransactionKind,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let wanted = kind.category_kind();
    let category = super::category::ensure_category(conn, couple_id, name, wanted).await?;
    if category.kind != wanted {
        let existing = match category.kind {
            crate::entities::CategoryKind::Income => "income",
            crate::entities::CategoryKind::Expense => "expense",
        };
        return Err(Error::validation(format!(
            "Category '{}' is already used for {existing} entries",
            category.name
        )));
    }
    Ok(category)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_record_transaction_validation() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;

        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result = record_transaction(
                &db,
                alice.id,
                pair.id,
                bad,
                "Groceries",
                "test",
                date(2024, 6, 1),
                TransactionKind::Expense,
            )
            .await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        // Nothing was written, not even a category
        assert_eq!(Transaction::find().count(&db).await?, 0);
        assert_eq!(Category::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_transaction_creates_category_once() -> Result<()> {
        let (db, alice, bob, pair) = setup_paired_couple().await?;

        let first = record_transaction(
            &db,
            alice.id,
            pair.id,
            42.5,
            "Groceries",
            "weekly shop",
            date(2024, 6, 3),
            TransactionKind::Expense,
        )
        .await?;
        assert_eq!(Category::find().count(&db).await?, 1);

        let second = record_transaction(
            &db,
            bob.id,
            pair.id,
            13.0,
            "Groceries",
            "top-up",
            date(2024, 6, 5),
            TransactionKind::Expense,
        )
        .await?;

        // Same text resolves to the same category row
        assert_eq!(first.category_id, second.category_id);
        assert_eq!(Category::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_transaction_kind_mismatch() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;

        record_transaction(
            &db,
            alice.id,
            pair.id,
            3000.0,
            "Salary",
            "june",
            date(2024, 6, 1),
            TransactionKind::Income,
        )
        .await?;

        let mismatch = record_transaction(
            &db,
            alice.id,
            pair.id,
            50.0,
            "Salary",
            "oops",
            date(2024, 6, 2),
            TransactionKind::Expense,
        )
        .await;
        assert!(matches!(mismatch, Err(Error::Validation { .. })));

        // Failed write leaves no ledger row behind
        assert_eq!(Transaction::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_ordering_and_filter() -> Result<()> {
        let (db, alice, bob, pair) = setup_paired_couple().await?;

        let older = record_transaction(
            &db,
            alice.id,
            pair.id,
            20.0,
            "Groceries",
            "older",
            date(2024, 6, 1),
            TransactionKind::Expense,
        )
        .await?;
        let newer = record_transaction(
            &db,
            bob.id,
            pair.id,
            35.0,
            "Utilities",
            "newer",
            date(2024, 6, 15),
            TransactionKind::Expense,
        )
        .await?;

        let all = list_transactions(&db, pair.id, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].transaction.id, newer.id);
        assert_eq!(all[0].category_name, "Utilities");
        assert_eq!(all[1].transaction.id, older.id);
        assert_eq!(all[1].category_name, "Groceries");

        let only_alice = list_transactions(&db, pair.id, Some(alice.id)).await?;
        assert_eq!(only_alice.len(), 1);
        assert_eq!(only_alice[0].transaction.id, older.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_edit_transaction_reresolves_category() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;

        let entry = record_transaction(
            &db,
            alice.id,
            pair.id,
            20.0,
            "Groceries",
            "shop",
            date(2024, 6, 1),
            TransactionKind::Expense,
        )
        .await?;

        let updated = edit_transaction(
            &db,
            alice.id,
            entry.id,
            pair.id,
            25.0,
            "Dining",
            "dinner instead",
            date(2024, 6, 2),
            TransactionKind::Expense,
        )
        .await?;

        assert_eq!(updated.amount, 25.0);
        assert_eq!(updated.description, "dinner instead");
        assert_ne!(updated.category_id, entry.category_id);
        assert_eq!(Category::find().count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_delete_enforce_ownership() -> Result<()> {
        let (db, alice, bob, pair) = setup_paired_couple().await?;

        let entry = record_transaction(
            &db,
            alice.id,
            pair.id,
            20.0,
            "Groceries",
            "shop",
            date(2024, 6, 1),
            TransactionKind::Expense,
        )
        .await?;

        let edit_by_partner = edit_transaction(
            &db,
            bob.id,
            entry.id,
            pair.id,
            99.0,
            "Groceries",
            "hijack",
            date(2024, 6, 1),
            TransactionKind::Expense,
        )
        .await;
        assert!(matches!(edit_by_partner, Err(Error::Unauthorized { .. })));

        let delete_by_partner = delete_transaction(&db, bob.id, entry.id).await;
        assert!(matches!(delete_by_partner, Err(Error::Unauthorized { .. })));

        delete_transaction(&db, alice.id, entry.id).await?;
        assert_eq!(Transaction::find().count(&db).await?, 0);

        let gone = delete_transaction(&db, alice.id, entry.id).await;
        assert!(matches!(gone, Err(Error::TransactionNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_category_summary_groups_by_category_and_kind() -> Result<()> {
        let (db, alice, bob, pair) = setup_paired_couple().await?;

        record_transaction(
            &db,
            alice.id,
            pair.id,
            40.0,
            "Groceries",
            "a",
            date(2024, 6, 3),
            TransactionKind::Expense,
        )
        .await?;
        record_transaction(
            &db,
            bob.id,
            pair.id,
            60.0,
            "Groceries",
            "b",
            date(2024, 6, 20),
            TransactionKind::Expense,
        )
        .await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            3000.0,
            "Salary",
            "june",
            date(2024, 6, 28),
            TransactionKind::Income,
        )
        .await?;
        // Outside the window
        record_transaction(
            &db,
            alice.id,
            pair.id,
            500.0,
            "Groceries",
            "july",
            date(2024, 7, 1),
            TransactionKind::Expense,
        )
        .await?;

        let summary = category_summary(&db, pair.id, 6, 2024).await?;
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category_name, "Groceries");
        assert_eq!(summary[0].kind, TransactionKind::Expense);
        assert_eq!(summary[0].total, 100.0);
        assert_eq!(summary[1].category_name, "Salary");
        assert_eq!(summary[1].kind, TransactionKind::Income);
        assert_eq!(summary[1].total, 3000.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_total() -> Result<()> {
        let (db, alice, _bob, pair) = setup_paired_couple().await?;

        record_transaction(
            &db,
            alice.id,
            pair.id,
            3000.0,
            "Salary",
            "june",
            date(2024, 6, 1),
            TransactionKind::Income,
        )
        .await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            1200.0,
            "Rent",
            "june rent",
            date(2024, 6, 1),
            TransactionKind::Expense,
        )
        .await?;
        record_transaction(
            &db,
            alice.id,
            pair.id,
            80.0,
            "Groceries",
            "shop",
            date(2024, 6, 12),
            TransactionKind::Expense,
        )
        .await?;

        let totals = monthly_total(&db, pair.id, 6, 2024).await?;
        assert_eq!(totals.income, 3000.0);
        assert_eq!(totals.expense, 1280.0);

        // Empty month sums to zero on both sides
        let empty = monthly_total(&db, pair.id, 1, 2024).await?;
        assert_eq!(empty.income, 0.0);
        assert_eq!(empty.expense, 0.0);

        Ok(())
    }
}
