//! Date keys and calendar-month arithmetic.
//!
//! A date key is the canonical `YYYY-MM-DD` identifier of a day in the
//! visitor's timezone. Because the format is zero-padded, ordering date keys
//! as text and ordering the underlying [`NaiveDate`]s agree.

use chrono::{Datelike, Months, NaiveDate};

/// Formats a day as its date key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a `YYYY-MM-DD` date key.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    parse_date_key(&format!("{}-01", value.trim()))
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Every day of the month containing `month`, in order.
pub fn month_days(month: NaiveDate) -> Vec<NaiveDate> {
    let start = month_start(month);
    start
        .iter_days()
        .take_while(|day| day.month() == start.month())
        .collect()
}

/// Moves a month forward (positive) or backward (negative) by `delta` months.
///
/// The result is always a first-of-month date. Out-of-range results leave the
/// month unchanged.
pub fn shift_month(month: NaiveDate, delta: i32) -> NaiveDate {
    let start = month_start(month);
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        start.checked_add_months(months)
    } else {
        start.checked_sub_months(months)
    };
    shifted.unwrap_or(start)
}
