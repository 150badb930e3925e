//! ISO-8601 timestamp helpers used for field values.
//!
//! Field-level timestamps (status entries, `Timestamp` fields) are stored as
//! strings with second precision and a `Z` suffix, e.g.
//! `"2011-02-09T09:23:34Z"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Format used for field-level timestamps.
pub const DATETIME_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Date-only form accepted on input.
pub const DATE_ISO_FORMAT: &str = "%Y-%m-%d";

/// Format a datetime as a field-level ISO timestamp.
#[must_use]
pub fn format_iso(value: DateTime<Utc>) -> String {
    value.format(DATETIME_ISO_FORMAT).to_string()
}

/// Current time as a field-level ISO timestamp.
#[must_use]
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

/// Parse either `YYYY-MM-DDTHH:MM:SSZ` or `YYYY-MM-DD`.
#[must_use]
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, DATETIME_ISO_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, DATE_ISO_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
