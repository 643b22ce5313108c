//! Date recognition and UTC normalization.
//!
//! Dates are always normalized: whatever textual form a source uses, the
//! coerced value is the canonical RFC 3339 UTC string with millisecond
//! precision (`2024-03-01T12:00:00.000Z`). Re-coercing a canonical string
//! yields the same string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EPOCH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(\d{1,19})$").unwrap());

static YEAR_FIRST_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").unwrap());

/// Zone-less date-times, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Offset-carrying date-times not accepted by the RFC 3339 parser (`+0100`).
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Date-only forms, read as midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Whether all-digit values are read as Unix epoch offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateParsing {
    /// Only textual date formats are recognized.
    #[default]
    TextOnly,
    /// Textual formats, plus epoch seconds (up to 10 digits), milliseconds
    /// (11 to 13 digits) or microseconds (14 to 16 digits).
    TextOrEpoch,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("unrecognized date format")]
    Unrecognized,

    #[error("epoch value {0} out of range")]
    EpochOutOfRange(String),
}

/// Parse `text` (already trimmed) into a UTC timestamp.
pub fn parse_date(text: &str, parsing: DateParsing) -> Result<DateTime<Utc>, DateError> {
    if let Some(caps) = EPOCH_REGEX.captures(text) {
        return match parsing {
            DateParsing::TextOrEpoch => parse_epoch(text, caps[1].len()),
            DateParsing::TextOnly => Err(DateError::Unrecognized),
        };
    }

    if YEAR_FIRST_REGEX.is_match(text) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.with_timezone(&Utc));
        }
        for format in OFFSET_DATETIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, format) {
                return Ok(dt.with_timezone(&Utc));
            }
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(naive.and_utc());
            }
        }
    } else if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
    }

    Err(DateError::Unrecognized)
}

fn parse_epoch(text: &str, digits: usize) -> Result<DateTime<Utc>, DateError> {
    let out_of_range = || DateError::EpochOutOfRange(text.to_string());
    let value: i64 = text.parse().map_err(|_| out_of_range())?;

    let parsed = match digits {
        0..=10 => DateTime::from_timestamp(value, 0),
        11..=13 => DateTime::from_timestamp_millis(value),
        14..=16 => DateTime::from_timestamp_micros(value),
        _ => None,
    };
    parsed.ok_or_else(out_of_range)
}

/// Canonical textual form of a normalized date.
pub fn canonical(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
