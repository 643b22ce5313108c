//! Typed-value representation of the coercion engine.
//!
//! [`FieldValueConverter`] produces [`FieldValue`]s for consumers that want
//! real numbers, booleans and timestamps instead of normalized strings. It
//! runs the exact same rules as document building; only the output differs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coerce::{coerce, date, DateParsing, Representation};
use crate::error::Result;
use crate::ingest::walker::{walk, TreeNode};
use crate::schema::Field;

/// A coerced value in typed form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Decoded binary payload.
    Binary(Vec<u8>),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// Any of the integer widths, after the width check.
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Normalized string form, identical to what document building emits
    /// for the same input (except binary, which is not re-encoded here).
    pub fn to_normalized_string(&self) -> Option<String> {
        match self {
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::DateTime(dt) => Some(date::canonical(dt)),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Binary(_) => None,
        }
    }
}

/// Typed representation strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedRepr;

impl Representation for TypedRepr {
    type Output = FieldValue;

    fn untyped(raw: &str) -> FieldValue {
        FieldValue::Text(raw.to_string())
    }

    fn binary(_trimmed: &str, bytes: Vec<u8>) -> FieldValue {
        FieldValue::Binary(bytes)
    }

    fn boolean(_trimmed: &str, value: bool) -> FieldValue {
        FieldValue::Boolean(value)
    }

    fn date(_trimmed: &str, value: DateTime<Utc>) -> FieldValue {
        FieldValue::DateTime(value)
    }

    fn integer(_trimmed: &str, value: i64) -> FieldValue {
        FieldValue::Integer(value)
    }

    fn float(_trimmed: &str, value: f64) -> FieldValue {
        FieldValue::Float(value)
    }

    fn text(trimmed: &str) -> FieldValue {
        FieldValue::Text(trimmed.to_string())
    }
}

/// Converts raw text or whole value trees into typed field values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValueConverter {
    date_parsing: DateParsing,
}

impl FieldValueConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_parsing(mut self, date_parsing: DateParsing) -> Self {
        self.date_parsing = date_parsing;
        self
    }

    pub fn convert(&self, field: &Field, raw: &str) -> Result<Option<FieldValue>> {
        coerce::<TypedRepr>(field, raw, self.date_parsing)
    }

    /// Convert every scalar under `node`, in walk order. Dropped values are skipped.
    pub fn convert_all<N: TreeNode>(&self, field: &Field, node: &N) -> Result<Vec<FieldValue>> {
        let mut values = Vec::new();
        walk(node, field, &mut |leaf| {
            if let Some(value) = self.convert(field, leaf)? {
                values.push(value);
            }
            Ok(())
        })?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngotError;
    use crate::schema::FieldType;
    use serde_json::json;

    #[test]
    fn test_typed_values() {
        let converter = FieldValueConverter::new();

        let age = Field::new("age", FieldType::Short);
        assert_eq!(converter.convert(&age, " 42 ").unwrap(), Some(FieldValue::Integer(42)));

        let price = Field::new("price", FieldType::Double);
        assert_eq!(converter.convert(&price, "19.99").unwrap().and_then(|v| v.as_float()), Some(19.99));

        let ratio = Field::new("ratio", FieldType::Float);
        assert_eq!(converter.convert(&ratio, "19.99").unwrap(), Some(FieldValue::Float(19.99)));
        assert!(converter.convert(&ratio, "1e39").is_err());

        let active = Field::new("active", FieldType::Boolean);
        assert_eq!(converter.convert(&active, "y").unwrap(), Some(FieldValue::Boolean(true)));

        let blob = Field::new("blob", FieldType::Binary);
        assert_eq!(
            converter.convert(&blob, "aGVsbG8=").unwrap().as_ref().and_then(|v| v.as_binary()),
            Some(&b"hello"[..])
        );
    }

    #[test]
    fn test_typed_shares_tolerance_policy() {
        let converter = FieldValueConverter::new();
        let strict = Field::new("n", FieldType::Integer);
        let lenient = Field::new("n", FieldType::Integer).with_ignore_malformed(true);

        assert!(matches!(converter.convert(&strict, "abc"), Err(IngotError::Malformed { .. })));
        assert_eq!(converter.convert(&lenient, "abc").unwrap(), None);
        assert_eq!(converter.convert(&strict, "  ").unwrap(), None);
    }

    #[test]
    fn test_typed_date_matches_text_form() {
        let field = Field::new("when", FieldType::Date);
        let converter = FieldValueConverter::new().with_date_parsing(DateParsing::TextOrEpoch);

        let typed = converter.convert(&field, "1709296200000").unwrap().unwrap();
        let text = crate::coerce::coerce_text(&field, "1709296200000", DateParsing::TextOrEpoch)
            .unwrap()
            .unwrap();
        assert_eq!(typed.to_normalized_string().unwrap(), text);
    }

    #[test]
    fn test_serializes_as_plain_json_values() {
        let field = Field::new("when", FieldType::Date);
        let when = FieldValueConverter::new().convert(&field, "2024-03-01 12:30:00").unwrap().unwrap();
        let values = vec![when, FieldValue::Integer(42), FieldValue::Boolean(true), FieldValue::Text("x".into())];

        let line = serde_json::to_string(&values).unwrap();
        assert!(line.starts_with(r#"["2024-03-01T12:30:00"#), "{line}");
        assert!(line.ends_with(r#"42,true,"x"]"#), "{line}");
    }

    #[test]
    fn test_convert_all_flattens_tree() {
        let field = Field::new("scores", FieldType::Long);
        let tree = json!([1, {"a": 2, "b": [3, null]}, " ", "4"]);

        let values = FieldValueConverter::new().convert_all(&field, &tree).unwrap();
        let ints: Vec<i64> = values.iter().filter_map(FieldValue::as_integer).collect();
        assert_eq!(ints, vec![1, 2, 3, 4]);
    }
}
