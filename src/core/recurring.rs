//! Recurrence engine - subscription templates and their materialization.
//!
//! A recurring transaction is a template that periodically turns into a
//! real ledger entry. Materialization runs on demand: `process_due` walks
//! every active item whose due date has arrived, writes an expense
//! transaction and advances the due date, one database transaction per
//! item. A failing item stays due and is retried on the next run; it never
//! aborts the batch.

use crate::{
    entities::{
        Frequency, RecurringStatus, RecurringTransaction, TransactionKind, recurring_transaction,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// Description prefix marking ledger entries the engine generated.
pub const RECURRING_PREFIX: &str = "[RECURRING]";

/// Creates a recurring transaction, starting `Active`.
pub async fn create_recurring(
    db: &DatabaseConnection,
    couple_id: i64,
    category_name: &str,
    amount: f64,
    frequency: Frequency,
    next_due_date: NaiveDate,
    description: &str,
) -> Result<recurring_transaction::Model> {
    super::transaction::validate_amount(amount)?;
    let category_name = category_name.trim();
    if category_name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }

    let item = recurring_transaction::ActiveModel {
        couple_id: Set(couple_id),
        category_name: Set(category_name.to_string()),
        amount: Set(amount),
        frequency: Set(frequency),
        next_due_date: Set(next_due_date),
        description: Set(description.to_string()),
        status: Set(RecurringStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Lists a couple's recurring transactions, soonest due first.
pub async fn list_recurring(
    db: &DatabaseConnection,
    couple_id: i64,
) -> Result<Vec<recurring_transaction::Model>> {
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::CoupleId.eq(couple_id))
        .order_by_asc(recurring_transaction::Column::NextDueDate)
        .order_by_asc(recurring_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes an item's status. `Active` and `Paused` toggle freely;
/// `Cancelled` is terminal and cannot be left.
pub async fn set_status(
    db: &DatabaseConnection,
    recurring_id: i64,
    status: RecurringStatus,
) -> Result<recurring_transaction::Model> {
    let item = RecurringTransaction::find_by_id(recurring_id)
        .one(db)
        .await?
        .ok_or(Error::RecurringNotFound { id: recurring_id })?;

    if item.status == RecurringStatus::Cancelled {
        return Err(Error::validation(
            "Cancelled subscriptions cannot change status",
        ));
    }

    let mut active: recurring_transaction::ActiveModel = item.into();
    active.status = Set(status);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a recurring transaction outright.
pub async fn delete_recurring(db: &DatabaseConnection, recurring_id: i64) -> Result<()> {
    let result = RecurringTransaction::delete_by_id(recurring_id)
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::RecurringNotFound { id: recurring_id });
    }
    Ok(())
}

/// Computes the due date following `current` for a given cadence.
///
/// Monthly advancement keeps the day of month, clamped to the end of the
/// target month (Jan 31 → Feb 29 in a leap year); December rolls into
/// January of the next year. Yearly advancement keeps month and day with
/// the same clamping (Feb 29 → Feb 28). Quarterly is a flat 90 days.
#[must_use]
pub fn advance_due_date(current: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => current + Duration::days(7),
        Frequency::Biweekly => current + Duration::days(14),
        Frequency::Monthly => {
            let (year, month) = if current.month() == 12 {
                (current.year() + 1, 1)
            } else {
                (current.year(), current.month() + 1)
            };
            clamp_to_month(current, year, month)
        }
        Frequency::Quarterly => current + Duration::days(90),
        Frequency::Yearly => clamp_to_month(current, current.year() + 1, current.month()),
    }
}

/// Materializes every due item for a couple, dated today.
pub async fn process_due(db: &DatabaseConnection, couple_id: i64) -> Result<usize> {
    process_due_on(db, couple_id, Utc::now().date_naive()).await
}

/// Materializes every active item with `next_due_date <= today`.
///
/// Each item gets its own database transaction covering the ledger insert
/// and the due-date advancement, so the two cannot diverge. An item that
/// fails is logged and left due for the next run; the rest of the batch
/// continues. Returns how many ledger entries were created.
pub async fn process_due_on(
    db: &DatabaseConnection,
    couple_id: i64,
    today: NaiveDate,
) -> Result<usize> {
    let due_items = RecurringTransaction::find()
        .filter(recurring_transaction::Column::CoupleId.eq(couple_id))
        .filter(recurring_transaction::Column::Status.eq(RecurringStatus::Active))
        .filter(recurring_transaction::Column::NextDueDate.lte(today))
        .order_by_asc(recurring_transaction::Column::NextDueDate)
        .all(db)
        .await?;

    let mut created = 0;
    for item in due_items {
        match materialize(db, &item, today).await {
            Ok(()) => created += 1,
            Err(err) => {
                tracing::warn!(
                    recurring_id = item.id,
                    category = %item.category_name,
                    error = %err,
                    "Failed to materialize recurring transaction; will retry next run"
                );
            }
        }
    }
    Ok(created)
}

/// Total of a couple's active subscriptions normalized to one month.
///
/// Weekly items count 4.33 times (average weeks per month), bi-weekly 2.17,
/// monthly once, quarterly a third and yearly a twelfth.
pub async fn monthly_equivalent_cost(db: &DatabaseConnection, couple_id: i64) -> Result<f64> {
    let items = RecurringTransaction::find()
        .filter(recurring_transaction::Column::CoupleId.eq(couple_id))
        .filter(recurring_transaction::Column::Status.eq(RecurringStatus::Active))
        .all(db)
        .await?;

    Ok(items
        .iter()
        .map(|item| monthly_equivalent(item.amount, item.frequency))
        .sum())
}

/// Active items due within the next `days_ahead` days.
pub async fn upcoming(
    db: &DatabaseConnection,
    couple_id: i64,
    days_ahead: u32,
) -> Result<Vec<recurring_transaction::Model>> {
    upcoming_on(db, couple_id, days_ahead, Utc::now().date_naive()).await
}

/// Active items due in `[today, today + days_ahead]`, soonest first.
pub async fn upcoming_on(
    db: &DatabaseConnection,
    couple_id: i64,
    days_ahead: u32,
    today: NaiveDate,
) -> Result<Vec<recurring_transaction::Model>> {
    let horizon = today + Duration::days(i64::from(days_ahead));
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::CoupleId.eq(couple_id))
        .filter(recurring_transaction::Column::Status.eq(RecurringStatus::Active))
        .filter(recurring_transaction::Column::NextDueDate.gte(today))
        .filter(recurring_transaction::Column::NextDueDate.lte(horizon))
        .order_by_asc(recurring_transaction::Column::NextDueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn materialize(
    db: &DatabaseConnection,
    item: &recurring_transaction::Model,
    today: NaiveDate,
) -> Result<()> {
    let txn = db.begin().await?;

    super::transaction::record_with_conn(
        &txn,
        None,
        item.couple_id,
        item.amount,
        &item.category_name,
        &format!("{RECURRING_PREFIX} {}", item.category_name),
        today,
        TransactionKind::Expense,
    )
    .await?;

    let mut advanced: recurring_transaction::ActiveModel = item.clone().into();
    advanced.next_due_date = Set(advance_due_date(item.next_due_date, item.frequency));
    advanced.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

fn monthly_equivalent(amount: f64, frequency: Frequency) -> f64 {
    match frequency {
        Frequency::Weekly => amount * 4.33,
        Frequency::Biweekly => amount * 2.17,
        Frequency::Monthly => amount,
        Frequency::Quarterly => amount / 3.0,
        Frequency::Yearly => amount / 12.0,
    }
}

/// Same day of month in (year, month), clamped to that month's last day.
/// Falls back to the input date if the target is somehow unconstructible.
fn clamp_to_month(current: NaiveDate, year: i32, month: u32) -> NaiveDate {
    let day = current.day().min(last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(current)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}
