//! Document ingestion: turn nested source JSON into flat, validated bulk documents.
//!
//! A [`FieldBinding`] (derived once from the schema) says which source paths
//! feed which fields. A [`DocumentBuilder`] walks each source record along
//! those paths, coerces every scalar it finds, accumulates the results, runs
//! optional [`Enricher`]s and serializes one line of JSON. A [`BulkWriter`]
//! frames those lines into a newline-delimited bulk payload.

pub mod binding;
pub mod builder;
pub mod document;
pub mod enrich;
pub mod walker;
pub mod writer;

pub use binding::{FieldBinding, PathBinding, PATH_SEPARATOR};
pub use builder::{BuildContext, BuiltDocument, DocumentBuilder};
pub use document::Document;
pub use enrich::{Contribution, Enricher, RegexExtractEnricher, TokenCountEnricher};
pub use walker::{flatten, walk, Leaf, NodeKind, TreeNode};
pub use writer::BulkWriter;
