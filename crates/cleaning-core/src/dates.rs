//! Lenient date parsing for the `last_review` column.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date or datetime string. Returns `None` for anything unparsable;
/// the caller decides whether that becomes a null cell.
///
/// Timezone-qualified inputs (RFC 3339) are converted to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// `YYYY-MM-DD` rendering.
pub fn format_date(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM:SS` rendering.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Whether any value carries a time of day other than midnight. A column is
/// rendered with [`format_datetime`] when this holds, else [`format_date`].
pub fn has_time_of_day<'a>(values: impl IntoIterator<Item = &'a NaiveDateTime>) -> bool {
    values.into_iter().any(|v| v.time() != NaiveTime::MIN)
}
