//! # Ingot - document ingestion for search indices
//!
//! Turns arbitrary, possibly deeply nested JSON records into flat documents
//! whose values have been validated and normalized against a declared field
//! schema, serialized as single-line JSON ready for a newline-delimited bulk
//! payload.
//!
//! ## Modules
//!
//! - **schema**: fields, mappings and indices
//! - **coerce**: per-type validation and normalization of scalar values
//! - **ingest**: path bindings, tree walking, document building, enrichers, bulk writing
//! - **config**: JSON pipeline configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ingot::{DocumentBuilder, Field, FieldBinding, FieldType, Index, Mapping};
//!
//! # fn main() -> ingot::Result<()> {
//! let mapping = Mapping::new("person")
//!     .with_field(Field::new("age", FieldType::Integer))?
//!     .with_field(Field::new("tags", FieldType::Keyword))?;
//! let index = Index::new("people").with_mapping(mapping);
//!
//! let binding = FieldBinding::new(&index, "person", [("tags", "profile.tags")], ["age"])?;
//! let builder = DocumentBuilder::new(Arc::new(binding));
//!
//! let line = builder.build(r#"{"age": " 42 ", "profile": {"tags": ["x", "x", "y"]}}"#)?;
//! assert_eq!(line, r#"{"tags":["x","y"],"age":"42"}"#);
//! # Ok(())
//! # }
//! ```

use std::io::{BufRead, Write};

use tracing::warn;

pub mod coerce;
pub mod config;
pub mod error;
pub mod ingest;
pub mod schema;

// Re-export commonly used types for convenience
pub use coerce::{coerce_text, DateParsing, FieldValue, FieldValueConverter};
pub use config::PipelineConfig;
pub use error::{IngotError, Result};
pub use ingest::{BuildContext, BulkWriter, DocumentBuilder, Enricher, FieldBinding};
pub use schema::{Field, FieldType, Index, Mapping};

/// Counts reported by [`ingest_ndjson`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub built: u64,
    pub skipped: u64,
}

/// Build every line of an NDJSON stream into `writer`.
///
/// Blank lines are ignored. With `skip_errors`, documents that fail to build
/// are logged and counted instead of aborting the stream; configuration and
/// I/O errors always abort.
pub fn ingest_ndjson<R: BufRead, W: Write>(
    reader: R,
    builder: &DocumentBuilder,
    writer: &mut BulkWriter<W>,
    skip_errors: bool,
) -> Result<IngestStats> {
    let mut ctx = BuildContext::new();
    let mut stats = IngestStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match builder.build_entry_with(&mut ctx, &line) {
            Ok(built) => {
                writer.write_document(&built)?;
                stats.built += 1;
            }
            Err(err) if skip_errors && !err.is_configuration() => {
                warn!(line = line_no + 1, error = %err, "skipping document");
                stats.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    writer.flush()?;
    Ok(stats)
}
