//! Pipeline configuration.
//!
//! A pipeline is described by a single JSON file:
//!
//! ```json
//! {
//!   "index": {
//!     "name": "library",
//!     "mappings": {
//!       "book": {"fields": [
//!         {"name": "isbn", "type": "keyword"},
//!         {"name": "title", "type": "text", "include_in_aggregate": true},
//!         {"name": "published", "type": "date", "ignore_malformed": true},
//!         {"name": "words", "type": "integer"}
//!       ]}
//!     }
//!   },
//!   "doc_type": "book",
//!   "fields": [{"field": "title", "paths": ["title", "meta.subtitle"]}],
//!   "identity_fields": ["isbn", "published"],
//!   "id_field": "isbn",
//!   "date_parsing": "text_only",
//!   "enrichers": [{"kind": "token_count", "field": "words"}]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coerce::DateParsing;
use crate::error::{IngotError, Result};
use crate::ingest::{DocumentBuilder, Enricher, FieldBinding, RegexExtractEnricher, TokenCountEnricher};
use crate::schema::{Field, Index};

/// Source paths feeding one schema field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBinding {
    pub field: String,
    pub paths: Vec<String>,
}

/// Built-in enricher declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnricherSpec {
    TokenCount { field: String },
    RegexExtract { field: String, pattern: String },
}

/// Configuration for building documents of one mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Schema definition.
    pub index: Index,

    /// Mapping type; falls back to the index default mapping.
    pub doc_type: String,

    /// Fields read from explicit source paths.
    #[serde(default)]
    pub fields: Vec<SourceBinding>,

    /// Fields read from the source path equal to their own name.
    #[serde(default)]
    pub identity_fields: Vec<String>,

    /// Field whose first value becomes the bulk `_id`.
    #[serde(default)]
    pub id_field: Option<String>,

    #[serde(default)]
    pub date_parsing: DateParsing,

    /// Enrichers, run in order.
    #[serde(default)]
    pub enrichers: Vec<EnricherSpec>,
}

impl PipelineConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| IngotError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| IngotError::config(e.to_string()))
    }

    /// Derive the field binding. Fails on unknown mappings or fields.
    pub fn binding(&self) -> Result<FieldBinding> {
        let associations = self
            .fields
            .iter()
            .flat_map(|source| source.paths.iter().map(move |path| (&source.field, path)));
        FieldBinding::new(&self.index, &self.doc_type, associations, &self.identity_fields)
    }

    /// Build a document builder with the configured binding, enrichers and policies.
    pub fn builder(&self) -> Result<DocumentBuilder> {
        let binding = self.binding()?;
        let mapping = self.index.resolve(&self.doc_type)?;
        let field = |name: &str| -> Result<Arc<Field>> {
            mapping.get(name).cloned().ok_or_else(|| IngotError::UnknownField {
                field: name.to_string(),
                mapping: mapping.name().to_string(),
            })
        };

        let mut builder = DocumentBuilder::new(Arc::new(binding)).with_date_parsing(self.date_parsing);

        if let Some(id_field) = &self.id_field {
            field(id_field)?;
            builder = builder.with_id_field(id_field.clone());
        }

        for declared in &self.enrichers {
            let enricher: Arc<dyn Enricher> = match declared {
                EnricherSpec::TokenCount { field: name } => Arc::new(TokenCountEnricher::new(field(name)?)),
                EnricherSpec::RegexExtract { field: name, pattern } => {
                    let pattern = Regex::new(pattern)
                        .map_err(|e| IngotError::config(format!("invalid pattern for '{name}': {e}")))?;
                    Arc::new(RegexExtractEnricher::new(field(name)?, pattern))
                }
            };
            builder = builder.with_enricher(enricher);
        }

        Ok(builder)
    }
}
