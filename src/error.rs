//! Error types for ingot.
//!
//! Every fatal condition raised while binding a schema or building a document
//! unwinds as an [`IngotError`]. A document is either fully built or not built
//! at all, so callers can log the error and skip or retry the source record.

use std::io;

use thiserror::Error;

use crate::schema::FieldType;

/// Boxed underlying cause of a malformed value (integer overflow, base64
/// decode failure, ...).
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for ingot operations.
#[derive(Error, Debug)]
pub enum IngotError {
    /// Neither the requested mapping type nor the index default exists.
    #[error("index '{index}' has no mapping for type '{doc_type}' and no default mapping")]
    UnknownMapping { index: String, doc_type: String },

    /// A declared field name is absent from the resolved mapping.
    #[error("field '{field}' does not exist in mapping '{mapping}'")]
    UnknownField { field: String, mapping: String },

    /// The source text is not valid JSON.
    #[error("failed to parse source document: {0}")]
    Parse(#[source] serde_json::Error),

    /// A scalar failed coercion for a field that does not ignore malformed values.
    #[error("malformed value {value:?} for field '{field}' of type {field_type}{}", fmt_cause(.source))]
    Malformed {
        field: String,
        field_type: String,
        value: String,
        #[source]
        source: Option<Cause>,
    },

    /// The field declares a type the coercion engine cannot handle.
    #[error("field '{field}' has unsupported type {field_type}")]
    UnsupportedType { field: String, field_type: FieldType },

    /// Serialized output contained a line break.
    #[error("serialized document spans more than one line")]
    MultiLine,

    /// An enricher failed while contributing fields.
    #[error("enricher '{name}' failed: {source}")]
    Enricher {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Pipeline configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors while writing bulk payloads or reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`IngotError`].
pub type Result<T> = std::result::Result<T, IngotError>;

fn fmt_cause(source: &Option<Cause>) -> String {
    match source {
        Some(cause) => format!(": {cause}"),
        None => String::new(),
    }
}

impl IngotError {
    /// Create a new malformed-value error.
    pub fn malformed<F, V>(field: F, field_type: impl ToString, value: V, source: Option<Cause>) -> Self
    where
        F: Into<String>,
        V: Into<String>,
    {
        IngotError::Malformed {
            field: field.into(),
            field_type: field_type.to_string(),
            value: value.into(),
            source,
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        IngotError::Config(msg.into())
    }

    /// Wrap an enricher failure.
    pub fn enricher<S: Into<String>>(name: S, source: anyhow::Error) -> Self {
        IngotError::Enricher {
            name: name.into(),
            source,
        }
    }

    /// True for errors raised while binding a schema, as opposed to per-document failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IngotError::UnknownMapping { .. } | IngotError::UnknownField { .. } | IngotError::Config(_)
        )
    }
}
