//! The accumulating output document.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::Field;

#[derive(Debug, Clone)]
struct Entry {
    field: Arc<Field>,
    values: Vec<String>,
}

/// Insertion-ordered mapping from field name to one or more distinct values.
///
/// A field only appears once a non-blank value has been stored for it. Values
/// within a field are unique and keep first-occurrence order. Serializes as a
/// JSON object: single values as scalars, several values as an array.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `field`. Returns false when the value is blank or
    /// already present for that field.
    pub fn push(&mut self, field: &Arc<Field>, value: String) -> bool {
        if value.trim().is_empty() {
            return false;
        }

        match self.by_name.get(field.name()) {
            Some(&idx) => {
                let values = &mut self.entries[idx].values;
                if values.contains(&value) {
                    return false;
                }
                values.push(value);
            }
            None => {
                self.by_name.insert(field.name().to_string(), self.entries.len());
                self.entries.push(Entry {
                    field: Arc::clone(field),
                    values: vec![value],
                });
            }
        }
        true
    }

    /// Values stored for `name`, in accumulation order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.by_name.get(name).map(|&idx| self.entries[idx].values.as_slice())
    }

    /// First value stored for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.field.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every field, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }

    /// Space-join the values of every field flagged `include_in_aggregate`
    /// onto `buffer`, in field order.
    pub fn append_aggregate(&self, buffer: &mut String) {
        let values = self
            .entries
            .iter()
            .filter(|entry| entry.field.include_in_aggregate())
            .flat_map(|entry| entry.values.iter());

        for value in values {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(value);
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry.values.as_slice() {
                [single] => map.serialize_entry(entry.field.name(), single)?,
                many => map.serialize_entry(entry.field.name(), many)?,
            }
        }
        map.end()
    }
}
