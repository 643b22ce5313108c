//! Mappings and indices.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IngotError, Result};
use crate::schema::field::Field;

/// Conventional key of the mapping used when no exact type match exists.
pub const DEFAULT_MAPPING: &str = "_default_";

/// An ordered set of fields describing one document shape.
#[derive(Debug, Clone)]
pub struct Mapping {
    name: String,
    fields: Vec<Arc<Field>>,
    by_name: HashMap<String, usize>,
}

impl Mapping {
    pub fn new(name: impl Into<String>) -> Self {
        Mapping {
            name: name.into(),
            fields: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add a field. Field names are unique within a mapping.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if field.name().is_empty() {
            return Err(IngotError::config(format!(
                "mapping '{}' declares a field with an empty name",
                self.name
            )));
        }
        if self.by_name.contains_key(field.name()) {
            return Err(IngotError::config(format!(
                "field '{}' declared twice in mapping '{}'",
                field.name(),
                self.name
            )));
        }
        self.by_name.insert(field.name().to_string(), self.fields.len());
        self.fields.push(Arc::new(field));
        Ok(())
    }

    pub fn with_field(mut self, field: Field) -> Result<Self> {
        self.add_field(field)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Field>> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct MappingRepr {
    #[serde(default)]
    fields: Vec<Field>,
}

/// A named collection of mappings keyed by type.
#[derive(Debug, Clone)]
pub struct Index {
    name: String,
    mappings: HashMap<String, Mapping>,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Index {
            name: name.into(),
            mappings: HashMap::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.add_mapping(mapping);
        self
    }

    /// Add or replace the mapping registered under the mapping's name.
    pub fn add_mapping(&mut self, mapping: Mapping) {
        self.mappings.insert(mapping.name().to_string(), mapping);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapping(&self, doc_type: &str) -> Option<&Mapping> {
        self.mappings.get(doc_type)
    }

    pub fn default_mapping(&self) -> Option<&Mapping> {
        self.mappings.get(DEFAULT_MAPPING)
    }

    /// Resolve the mapping for `doc_type`, falling back to the default mapping.
    pub fn resolve(&self, doc_type: &str) -> Result<&Mapping> {
        self.mapping(doc_type)
            .or_else(|| self.default_mapping())
            .ok_or_else(|| IngotError::UnknownMapping {
                index: self.name.clone(),
                doc_type: doc_type.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize)]
struct IndexRepr {
    name: String,
    #[serde(default)]
    mappings: HashMap<String, MappingRepr>,
}

impl Serialize for Index {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let repr = IndexRepr {
            name: self.name.clone(),
            mappings: self
                .mappings
                .iter()
                .map(|(key, mapping)| {
                    let fields = mapping.fields.iter().map(|f| Field::clone(f)).collect();
                    (key.clone(), MappingRepr { fields })
                })
                .collect(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Index {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = IndexRepr::deserialize(deserializer)?;
        let mut index = Index::new(repr.name);
        for (key, mapping_repr) in repr.mappings {
            let mut mapping = Mapping::new(key);
            for field in mapping_repr.fields {
                mapping.add_field(field).map_err(serde::de::Error::custom)?;
            }
            index.add_mapping(mapping);
        }
        Ok(index)
    }
}
