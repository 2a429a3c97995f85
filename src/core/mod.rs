//! Core business logic - framework-agnostic operations over the shared
//! ledger. All functions are async, take a database connection, and return
//! `Result` types; the UI and reporting layers sit on top of these.

/// Role-gated administrative facade
pub mod admin;
/// Monthly planned-spend ceilings per category
pub mod budget;
/// Couple-scoped categories, created on first use
pub mod category;
/// Registration, login and credential management
pub mod identity;
/// Pairing invitations, couple linkage and unpairing
pub mod pairing;
/// Subscription templates and their materialization
pub mod recurring;
/// Ledger entries and period aggregates
pub mod transaction;

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Half-open date range `[first of month, first of next month)` used by all
/// period queries.
pub(crate) fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("Invalid month: {year}-{month:02}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

/// Budget month key in `YYYY-MM` form.
pub(crate) fn month_year_key(year: i32, month: u32) -> Result<String> {
    if !(1..=12).contains(&month) {
        return Err(Error::validation(format!("Invalid month: {month}")));
    }
    Ok(format!("{year}-{month:02}"))
}
