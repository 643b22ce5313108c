//! Field definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a schema field.
///
/// Geo-point and the range types are part of the schema vocabulary but have no
/// coercion rule; values bound to them are always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Binary,
    Boolean,
    Date,
    Byte,
    Short,
    Integer,
    Long,
    Double,
    Float,
    Text,
    Keyword,
    GeoPoint,
    IntegerRange,
    LongRange,
    FloatRange,
    DoubleRange,
    DateRange,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Binary => "binary",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Byte => "byte",
            FieldType::Short => "short",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::GeoPoint => "geo_point",
            FieldType::IntegerRange => "integer_range",
            FieldType::LongRange => "long_range",
            FieldType::FloatRange => "float_range",
            FieldType::DoubleRange => "double_range",
            FieldType::DateRange => "date_range",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed element of a mapping.
///
/// `ignore_malformed` and `include_in_aggregate` are tri-state; unset behaves
/// as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ignore_malformed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    include_in_aggregate: Option<bool>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type: Some(field_type),
            fields: Vec::new(),
            ignore_malformed: None,
            include_in_aggregate: None,
        }
    }

    /// A field without a declared type. Values pass through unvalidated.
    pub fn untyped(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            field_type: None,
            fields: Vec::new(),
            ignore_malformed: None,
            include_in_aggregate: None,
        }
    }

    pub fn with_ignore_malformed(mut self, ignore: bool) -> Self {
        self.ignore_malformed = Some(ignore);
        self
    }

    pub fn with_include_in_aggregate(mut self, include: bool) -> Self {
        self.include_in_aggregate = Some(include);
        self
    }

    pub fn with_sub_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> Option<FieldType> {
        self.field_type
    }

    /// Declared type name, `untyped` when none is declared.
    pub fn type_name(&self) -> &'static str {
        self.field_type.map_or("untyped", FieldType::as_str)
    }

    /// Nested sub-fields (multi-field definitions).
    pub fn sub_fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn ignore_malformed(&self) -> bool {
        self.ignore_malformed.unwrap_or(false)
    }

    pub fn include_in_aggregate(&self) -> bool {
        self.include_in_aggregate.unwrap_or(false)
    }
}
