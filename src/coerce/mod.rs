//! Type coercion engine.
//!
//! A single decision table turns raw scalar text into a normalized value for a
//! field's declared type. What the normalized value looks like is chosen by a
//! [`Representation`]: [`TextRepr`] produces the strings written into bulk
//! documents, [`TypedRepr`](typed::TypedRepr) produces typed
//! [`FieldValue`](typed::FieldValue)s. Both share the same parsing rules and
//! the same `ignore_malformed` tolerance policy.
//!
//! ## Outcomes
//!
//! - `Ok(Some(value))`: the normalized value.
//! - `Ok(None)`: dropped. Blank input, or a malformed value on a field that
//!   ignores malformed values.
//! - `Err(_)`: a malformed value on a strict field, or a type with no
//!   coercion rule (never tolerated).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::{Cause, IngotError, Result};
use crate::schema::{Field, FieldType};

pub mod date;
pub mod typed;

pub use date::{DateError, DateParsing};
pub use typed::{FieldValue, FieldValueConverter, TypedRepr};

/// Output strategy for the coercion engine.
///
/// Each constructor receives the trimmed source text alongside the parsed
/// value so a representation can keep the original text where parsing would
/// lose precision.
pub trait Representation {
    type Output;

    /// Value of a field without a declared type; `raw` is untrimmed.
    fn untyped(raw: &str) -> Self::Output;
    fn binary(trimmed: &str, bytes: Vec<u8>) -> Self::Output;
    fn boolean(trimmed: &str, value: bool) -> Self::Output;
    fn date(trimmed: &str, value: DateTime<Utc>) -> Self::Output;
    fn integer(trimmed: &str, value: i64) -> Self::Output;
    fn float(trimmed: &str, value: f64) -> Self::Output;
    fn text(trimmed: &str) -> Self::Output;
}

/// Normalized-string representation used for document building.
///
/// Numbers and binary keep their trimmed source text, booleans become
/// `true`/`false`, dates become canonical UTC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRepr;

impl Representation for TextRepr {
    type Output = String;

    fn untyped(raw: &str) -> String {
        raw.to_string()
    }

    fn binary(trimmed: &str, _bytes: Vec<u8>) -> String {
        trimmed.to_string()
    }

    fn boolean(_trimmed: &str, value: bool) -> String {
        value.to_string()
    }

    fn date(_trimmed: &str, value: DateTime<Utc>) -> String {
        date::canonical(&value)
    }

    fn integer(trimmed: &str, _value: i64) -> String {
        trimmed.to_string()
    }

    fn float(trimmed: &str, _value: f64) -> String {
        trimmed.to_string()
    }

    fn text(trimmed: &str) -> String {
        trimmed.to_string()
    }
}

/// Coerce `raw` for `field` using representation `R`.
pub fn coerce<R: Representation>(field: &Field, raw: &str, dates: DateParsing) -> Result<Option<R::Output>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(field_type) = field.field_type() else {
        return Ok(Some(R::untyped(raw)));
    };

    match field_type {
        FieldType::Binary => match STANDARD.decode(trimmed) {
            Ok(bytes) => Ok(Some(R::binary(trimmed, bytes))),
            Err(e) => reject(field, field_type, raw, Some(Box::new(e))),
        },
        FieldType::Boolean => match parse_boolean(trimmed) {
            Some(value) => Ok(Some(R::boolean(trimmed, value))),
            None => reject(field, field_type, raw, None),
        },
        FieldType::Date => match date::parse_date(trimmed, dates) {
            Ok(value) => Ok(Some(R::date(trimmed, value))),
            Err(e) => reject(field, field_type, raw, Some(Box::new(e))),
        },
        FieldType::Byte => integer::<i8, R>(field, field_type, raw, trimmed),
        FieldType::Short => integer::<i16, R>(field, field_type, raw, trimmed),
        FieldType::Integer => integer::<i32, R>(field, field_type, raw, trimmed),
        FieldType::Long => integer::<i64, R>(field, field_type, raw, trimmed),
        // Width checked at f32, value read at f64.
        FieldType::Float => match trimmed.parse::<f32>() {
            Ok(narrow) if narrow.is_finite() => {
                let value = trimmed.parse::<f64>().unwrap_or(f64::from(narrow));
                Ok(Some(R::float(trimmed, value)))
            }
            Ok(_) => reject(field, field_type, raw, None),
            Err(e) => reject(field, field_type, raw, Some(Box::new(e))),
        },
        FieldType::Double => match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(R::float(trimmed, value))),
            Ok(_) => reject(field, field_type, raw, None),
            Err(e) => reject(field, field_type, raw, Some(Box::new(e))),
        },
        FieldType::Text | FieldType::Keyword => Ok(Some(R::text(trimmed))),
        FieldType::GeoPoint
        | FieldType::IntegerRange
        | FieldType::LongRange
        | FieldType::FloatRange
        | FieldType::DoubleRange
        | FieldType::DateRange => Err(IngotError::UnsupportedType {
            field: field.name().to_string(),
            field_type,
        }),
    }
}

/// Coerce into the normalized string written to bulk documents.
pub fn coerce_text(field: &Field, raw: &str, dates: DateParsing) -> Result<Option<String>> {
    coerce::<TextRepr>(field, raw, dates)
}

/// Lenient boolean words, case-insensitive.
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn integer<T, R>(field: &Field, field_type: FieldType, raw: &str, trimmed: &str) -> Result<Option<R::Output>>
where
    T: std::str::FromStr + Into<i64>,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: Representation,
{
    match trimmed.parse::<T>() {
        Ok(value) => Ok(Some(R::integer(trimmed, value.into()))),
        Err(e) => reject(field, field_type, raw, Some(Box::new(e))),
    }
}

/// Apply the field's tolerance: drop when malformed values are ignored, fail
/// otherwise. The error carries `raw` exactly as it appeared in the source.
fn reject<T>(field: &Field, field_type: FieldType, raw: &str, cause: Option<Cause>) -> Result<Option<T>> {
    if field.ignore_malformed() {
        trace!(field = field.name(), %field_type, value = raw.trim(), "dropping malformed value");
        return Ok(None);
    }
    Err(IngotError::malformed(field.name(), field_type, raw, cause))
}
