//! Schema-to-source path bindings.
//!
//! A [`FieldBinding`] is the pre-computed plan for building documents of one
//! mapping: for every source path it lists the schema fields that path feeds.
//! It is derived once from an [`Index`], a mapping type and the caller's
//! field/path declarations, then shared read-only by any number of builders.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{IngotError, Result};
use crate::schema::{Field, Index, Mapping};

/// Separator between segments of a source path (`author.name`).
pub const PATH_SEPARATOR: char = '.';

/// One source path and the fields it populates, in declaration order.
#[derive(Debug, Clone)]
pub struct PathBinding {
    path: String,
    segments: Vec<String>,
    fields: Vec<Arc<Field>>,
}

impl PathBinding {
    fn new(path: &str) -> Self {
        PathBinding {
            path: path.to_string(),
            segments: path.split(PATH_SEPARATOR).map(str::to_string).collect(),
            fields: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }
}

/// Reverse index from source path to target fields.
#[derive(Debug)]
pub struct FieldBinding {
    index: String,
    mapping: String,
    paths: Vec<PathBinding>,
    targets: OnceCell<Vec<Arc<Field>>>,
}

impl FieldBinding {
    /// Derive a binding.
    ///
    /// `associations` pairs a field name with a source path; a field may be
    /// listed several times to read from several paths. `identity_fields`
    /// are read from the source path equal to their own name.
    ///
    /// Fails if the mapping cannot be resolved or any field name is absent
    /// from it.
    pub fn new<I, F, P, J, S>(index: &Index, doc_type: &str, associations: I, identity_fields: J) -> Result<Self>
    where
        I: IntoIterator<Item = (F, P)>,
        F: AsRef<str>,
        P: AsRef<str>,
        J: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mapping = index.resolve(doc_type)?;

        let mut paths: Vec<PathBinding> = Vec::new();
        let mut by_path: HashMap<String, usize> = HashMap::new();

        let identity = identity_fields.into_iter().map(|name| {
            let name = name.as_ref().to_string();
            (name.clone(), name)
        });
        let declared = associations
            .into_iter()
            .map(|(field, path)| (field.as_ref().to_string(), path.as_ref().to_string()));

        for (field_name, path) in declared.chain(identity) {
            let field = lookup(mapping, &field_name)?;
            if path.is_empty() {
                return Err(IngotError::config(format!("field '{field_name}' is bound to an empty source path")));
            }

            let slot = *by_path.entry(path.clone()).or_insert_with(|| {
                paths.push(PathBinding::new(&path));
                paths.len() - 1
            });
            let binding = &mut paths[slot];
            if !binding.fields.iter().any(|f| f.name() == field.name()) {
                binding.fields.push(Arc::clone(field));
            }
        }

        debug!(
            index = index.name(),
            mapping = mapping.name(),
            paths = paths.len(),
            "derived field binding"
        );

        Ok(FieldBinding {
            index: index.name().to_string(),
            mapping: mapping.name().to_string(),
            paths,
            targets: OnceCell::new(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Name of the resolved mapping (the default mapping when no exact type matched).
    pub fn mapping_name(&self) -> &str {
        &self.mapping
    }

    /// Distinct source paths in first-declaration order.
    pub fn paths(&self) -> &[PathBinding] {
        &self.paths
    }

    /// Fields fed by `path`, empty if the path is not bound.
    pub fn fields_for(&self, path: &str) -> &[Arc<Field>] {
        self.paths
            .iter()
            .find(|binding| binding.path == path)
            .map(|binding| binding.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Every distinct target field, in first-binding order.
    pub fn targets(&self) -> &[Arc<Field>] {
        self.targets.get_or_init(|| {
            let mut seen: Vec<Arc<Field>> = Vec::new();
            for field in self.paths.iter().flat_map(|binding| binding.fields.iter()) {
                if !seen.iter().any(|f| f.name() == field.name()) {
                    seen.push(Arc::clone(field));
                }
            }
            seen
        })
    }
}

fn lookup<'m>(mapping: &'m Mapping, name: &str) -> Result<&'m Arc<Field>> {
    mapping.get(name).ok_or_else(|| IngotError::UnknownField {
        field: name.to_string(),
        mapping: mapping.name().to_string(),
    })
}
