//! Time helpers
//!
//! Date to timestamp conversion happens in the API handler layer;
//! repositories only ever receive `i64` Unix millis. All conversions use
//! the machine's local timezone, matching the single-site deployment.

use chrono::NaiveDate;

use super::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Start of day (00:00:00 local) as Unix millis
///
/// DST gap fallback: if local midnight does not exist, fall back to UTC.
pub fn day_start_millis(date: NaiveDate) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(chrono::Local)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// End of day as Unix millis: next day 00:00:00 local minus 1 ms,
/// suitable for inclusive `<= to` range bounds.
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day) - 1
}

/// Format Unix millis as a local "YYYY-MM-DD HH:MM:SS" string (CSV export)
pub fn format_millis(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}
