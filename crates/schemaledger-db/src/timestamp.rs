//! Parsing of `applied_at` values into UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use schemaledger_common::DecodeError;

use crate::queryer::SqlValue;

/// Layouts carrying an explicit offset.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Offset-less layouts, read as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Julian day number of the Unix epoch.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

/// Parse a textual timestamp. Offset-bearing forms keep their offset,
/// anything without one is taken as UTC.
pub(crate) fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // A trailing `Z` on the space-separated forms means UTC too.
    let s = s.strip_suffix('Z').unwrap_or(s);

    OFFSET_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(s, layout).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Seconds since the Unix epoch.
pub(crate) fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// SQLite `julianday()` value.
pub(crate) fn from_julian_day(day: f64) -> Option<DateTime<Utc>> {
    if !day.is_finite() {
        return None;
    }
    let millis = ((day - UNIX_EPOCH_JULIAN_DAY) * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

pub(crate) fn invalid(value: &SqlValue) -> DecodeError {
    let shown = match value {
        SqlValue::Text(s) => s.clone(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        other => other.type_name().to_string(),
    };
    DecodeError::InvalidTimestamp(shown)
}

pub(crate) fn unexpected(value: &SqlValue) -> DecodeError {
    DecodeError::UnexpectedType {
        column: "applied_at",
        expected: "timestamp",
        found: value.type_name(),
    }
}
