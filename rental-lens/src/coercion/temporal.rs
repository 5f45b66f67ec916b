//! Tolerant parsing of date and datetime strings.
//!
//! Accepted shapes:
//! - RFC 3339 (`2007-02-15T22:25:46Z`, `2007-02-15T22:25:46+02:00`)
//! - ISO date and datetime with `T` or space, optional seconds, optional
//!   fraction, optional numeric offset (`2007-02-15 22:25:46.996577`,
//!   `2006-02-15 09:34:33+00`)
//! - `YYYY/MM/DD`, US `MM/DD/YYYY` (optionally with time), EU `DD.MM.YYYY`
//! - `15-Feb-2007`, `Feb 15, 2007`, `February 15, 2007`
//!
//! Date-only values map to midnight. Values with an offset are converted to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Cheap shape check run before any format is attempted.
static TEMPORAL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"^(\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}|\d{1,2}-[A-Za-z]{3}-\d{4}|[A-Za-z]{3,9} \d{1,2}, \d{4})",
    )
    .expect("Hard-coded regex pattern should be valid")
});

/// Parses a value into a naive UTC datetime, or `None` when no format fits.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() || value.len() > 64 || !TEMPORAL_SHAPE.is_match(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parses a value into nanoseconds since the Unix epoch.
///
/// Datetimes outside the range representable in nanoseconds (roughly years
/// 1677 to 2262) yield `None`, like unparsable input.
pub fn parse_timestamp_nanos(value: &str) -> Option<i64> {
    parse_datetime(value).and_then(|dt| dt.and_utc().timestamp_nanos_opt())
}
