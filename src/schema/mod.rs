//! Schema model: fields grouped into mappings, mappings grouped into an index.
//!
//! Pure data with lookup. Built once, then shared read-only.

pub mod field;
pub mod mapping;

pub use field::{Field, FieldType};
pub use mapping::{Index, Mapping, DEFAULT_MAPPING};
