//! Document building driven by a [`FieldBinding`].
//!
//! [`DocumentBuilder`] holds only immutable state and can be shared across
//! threads. All per-document scratch state lives in a [`BuildContext`], which
//! is either created per call ([`DocumentBuilder::build`]) or owned by the
//! caller and reused across calls ([`DocumentBuilder::build_with`]). The
//! context is cleared before and after every build, whether it succeeds or
//! fails.
//!
//! ## Algorithm
//!
//! 1. Parse the source text.
//! 2. For every bound path, descend the tree segment by segment, fanning out
//!    across arrays; missing segments yield nothing. Every scalar reached at
//!    the end of the path is coerced against each field bound to the path and
//!    accumulated.
//! 3. Run enrichers over the aggregate buffer, accumulating their
//!    contributions the same way.
//! 4. Serialize the document as one line of compact JSON.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::coerce::{coerce_text, DateParsing};
use crate::error::{IngotError, Result};
use crate::ingest::binding::FieldBinding;
use crate::ingest::document::Document;
use crate::ingest::enrich::{Contribution, Enricher};
use crate::ingest::walker::{opaque_leaf, visit_leaves, Leaf, NodeKind, TreeNode};
use crate::schema::Field;

/// Per-call scratch state: the accumulating document and the aggregate buffer.
#[derive(Debug, Default)]
pub struct BuildContext {
    document: Document,
    aggregate: String,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.document.clear();
        self.aggregate.clear();
    }
}

/// A built document line plus the value of the configured id field, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltDocument {
    pub id: Option<String>,
    pub line: String,
}

/// Builds single-line index documents from source JSON.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    binding: Arc<FieldBinding>,
    enrichers: Vec<Arc<dyn Enricher>>,
    date_parsing: DateParsing,
    id_field: Option<String>,
}

impl DocumentBuilder {
    pub fn new(binding: Arc<FieldBinding>) -> Self {
        DocumentBuilder {
            binding,
            enrichers: Vec::new(),
            date_parsing: DateParsing::default(),
            id_field: None,
        }
    }

    /// Append an enricher; enrichers run in the order they were added.
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    pub fn with_date_parsing(mut self, date_parsing: DateParsing) -> Self {
        self.date_parsing = date_parsing;
        self
    }

    /// Field whose first value is reported as the document id by [`Self::build_entry_with`].
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    /// Build a document with a fresh context.
    pub fn build(&self, source: &str) -> Result<String> {
        self.build_with(&mut BuildContext::new(), source)
    }

    /// Build a document reusing `ctx`.
    pub fn build_with(&self, ctx: &mut BuildContext, source: &str) -> Result<String> {
        self.build_entry_with(ctx, source).map(|built| built.line)
    }

    /// Build a document reusing `ctx`, also reporting its id.
    pub fn build_entry_with(&self, ctx: &mut BuildContext, source: &str) -> Result<BuiltDocument> {
        let tree = match serde_json::from_str::<Value>(source) {
            Ok(tree) => tree,
            Err(e) => {
                let err = IngotError::Parse(e);
                debug!(mapping = self.binding.mapping_name(), error = %err, "document_failed");
                return Err(err);
            }
        };
        self.build_tree(ctx, &tree)
    }

    /// Build from an already parsed tree.
    pub fn build_tree<N: TreeNode>(&self, ctx: &mut BuildContext, tree: &N) -> Result<BuiltDocument> {
        let start = Instant::now();
        ctx.clear();
        let result = self.assemble(ctx, tree);
        ctx.clear();

        let elapsed_micros = start.elapsed().as_micros() as u64;
        match &result {
            Ok(built) => debug!(
                mapping = self.binding.mapping_name(),
                bytes = built.line.len(),
                elapsed_micros,
                "document_built"
            ),
            Err(err) => debug!(
                mapping = self.binding.mapping_name(),
                error = %err,
                elapsed_micros,
                "document_failed"
            ),
        }
        result
    }

    fn assemble<N: TreeNode>(&self, ctx: &mut BuildContext, tree: &N) -> Result<BuiltDocument> {
        for binding in self.binding.paths() {
            let fields = binding.fields();
            descend(tree, binding.segments(), &mut |node| {
                self.collect(&mut ctx.document, node, fields)
            })?;
        }

        if !self.enrichers.is_empty() {
            self.enrich(ctx)?;
        }

        let line = serde_json::to_string(&ctx.document)?;
        if line.contains('\n') {
            return Err(IngotError::MultiLine);
        }

        let id = self
            .id_field
            .as_deref()
            .and_then(|name| ctx.document.first(name))
            .map(str::to_string);
        Ok(BuiltDocument { id, line })
    }

    /// Coerce every leaf under `node` against each field and accumulate.
    fn collect<N: TreeNode>(&self, document: &mut Document, node: &N, fields: &[Arc<Field>]) -> Result<()> {
        visit_leaves(node, &mut |leaf| match leaf {
            Leaf::Scalar(text) => {
                for field in fields {
                    if let Some(value) = coerce_text(field, &text, self.date_parsing)? {
                        document.push(field, value);
                    }
                }
                Ok(())
            }
            Leaf::Opaque(description) => fields.iter().try_for_each(|field| opaque_leaf(field, &description)),
        })
    }

    fn enrich(&self, ctx: &mut BuildContext) -> Result<()> {
        if self.enrichers.iter().any(|enricher| enricher.needs_aggregate()) {
            ctx.document.append_aggregate(&mut ctx.aggregate);
        }

        for enricher in &self.enrichers {
            let contributions = enricher
                .enrich(&ctx.aggregate)
                .map_err(|e| IngotError::enricher(enricher.name(), e))?;

            for Contribution { field, value } in contributions {
                let Some(value) = coerce_text(&field, &value, self.date_parsing)? else {
                    continue;
                };
                if !ctx.aggregate.is_empty() {
                    ctx.aggregate.push(' ');
                }
                ctx.aggregate.push_str(&value);
                ctx.document.push(&field, value);
            }
        }
        Ok(())
    }
}

/// Follow `segments` from `node`, fanning out across arrays, and visit every
/// node found at the end of the path.
fn descend<'a, N: TreeNode>(
    node: &'a N,
    segments: &[String],
    visit: &mut dyn FnMut(&'a N) -> Result<()>,
) -> Result<()> {
    if let NodeKind::Array(items) = node.classify() {
        for item in items {
            descend(item, segments, visit)?;
        }
        return Ok(());
    }

    match segments.split_first() {
        None => visit(node),
        Some((head, rest)) => match node.child(head) {
            Some(child) => descend(child, rest, visit),
            None => Ok(()),
        },
    }
}
