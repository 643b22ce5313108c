//! Value tree walking.
//!
//! Flattens a JSON-like tree into its scalar leaves. Arrays and objects are
//! transparent (object keys are ignored, only values are visited), nulls and
//! missing nodes contribute nothing, and opaque nodes that cannot be rendered
//! as a primitive are reported so the consuming field can decide whether to
//! fail or skip.

use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

use crate::error::{IngotError, Result};
use crate::schema::Field;

/// Child nodes of an array or object, in document order.
pub type Children<'a, N> = Box<dyn Iterator<Item = &'a N> + 'a>;

/// Classification of a single tree node.
pub enum NodeKind<'a, N> {
    Null,
    Scalar(Cow<'a, str>),
    Array(Children<'a, N>),
    Object(Children<'a, N>),
    /// A value that is neither a scalar nor a container; carries a short description.
    Opaque(Cow<'a, str>),
}

/// A JSON-like value tree.
pub trait TreeNode: Sized {
    fn classify(&self) -> NodeKind<'_, Self>;

    /// Named child of an object node; `None` for missing keys and non-objects.
    fn child(&self, name: &str) -> Option<&Self>;
}

impl TreeNode for Value {
    fn classify(&self) -> NodeKind<'_, Self> {
        match self {
            Value::Null => NodeKind::Null,
            Value::Bool(b) => NodeKind::Scalar(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Number(n) => NodeKind::Scalar(Cow::Owned(n.to_string())),
            Value::String(s) => NodeKind::Scalar(Cow::Borrowed(s)),
            Value::Array(items) => NodeKind::Array(Box::new(items.iter())),
            Value::Object(map) => NodeKind::Object(Box::new(map.values())),
        }
    }

    fn child(&self, name: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }
}

/// A leaf reached by [`visit_leaves`].
#[derive(Debug, PartialEq)]
pub enum Leaf<'a> {
    Scalar(Cow<'a, str>),
    Opaque(Cow<'a, str>),
}

/// Visit every leaf under `node` in document order.
pub fn visit_leaves<'a, N: TreeNode>(
    node: &'a N,
    visit: &mut dyn FnMut(Leaf<'a>) -> Result<()>,
) -> Result<()> {
    match node.classify() {
        NodeKind::Null => Ok(()),
        NodeKind::Scalar(text) => visit(Leaf::Scalar(text)),
        NodeKind::Opaque(description) => visit(Leaf::Opaque(description)),
        NodeKind::Array(children) | NodeKind::Object(children) => {
            for child in children {
                visit_leaves(child, visit)?;
            }
            Ok(())
        }
    }
}

/// Report an opaque leaf against `field`: skipped when the field ignores
/// malformed values, an error otherwise.
pub fn opaque_leaf(field: &Field, description: &str) -> Result<()> {
    if field.ignore_malformed() {
        trace!(field = field.name(), description, "skipping opaque value");
        return Ok(());
    }
    Err(IngotError::malformed(field.name(), field.type_name(), description, None))
}

/// Visit every scalar under `node` on behalf of a single field.
pub fn walk<N: TreeNode>(node: &N, field: &Field, visit: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
    visit_leaves(node, &mut |leaf| match leaf {
        Leaf::Scalar(text) => visit(&*text),
        Leaf::Opaque(description) => opaque_leaf(field, &description),
    })
}

/// Collect every scalar under `node` as text.
pub fn flatten<N: TreeNode>(node: &N, field: &Field) -> Result<Vec<String>> {
    let mut leaves = Vec::new();
    walk(node, field, &mut |text| {
        leaves.push(text.to_string());
        Ok(())
    })?;
    Ok(leaves)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    /// Minimal tree with an opaque variant, standing in for host object graphs.
    #[derive(Debug)]
    pub(crate) enum HostNode {
        Text(String),
        List(Vec<HostNode>),
        Record(Vec<(String, HostNode)>),
        Handle(&'static str),
    }

    impl TreeNode for HostNode {
        fn classify(&self) -> NodeKind<'_, Self> {
            match self {
                HostNode::Text(s) => NodeKind::Scalar(Cow::Borrowed(s)),
                HostNode::List(items) => NodeKind::Array(Box::new(items.iter())),
                HostNode::Record(entries) => NodeKind::Object(Box::new(entries.iter().map(|(_, v)| v))),
                HostNode::Handle(kind) => NodeKind::Opaque(Cow::Borrowed(kind)),
            }
        }

        fn child(&self, name: &str) -> Option<&Self> {
            match self {
                HostNode::Record(entries) => entries.iter().find(|(k, _)| k == name).map(|(_, v)| v),
                _ => None,
            }
        }
    }

    fn keyword() -> Field {
        Field::new("k", FieldType::Keyword)
    }

    #[test]
    fn test_flatten_is_transparent() {
        let tree = json!([{"x": 1}, {"x": 2, "y": [true, null, "z"]}]);
        assert_eq!(flatten(&tree, &keyword()).unwrap(), vec!["1", "2", "true", "z"]);
    }

    #[test]
    fn test_object_values_in_document_order() {
        let tree: Value = serde_json::from_str(r#"{"b": "first", "a": "second"}"#).unwrap();
        assert_eq!(flatten(&tree, &keyword()).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_null_contributes_nothing() {
        assert!(flatten(&json!(null), &keyword()).unwrap().is_empty());
        assert!(flatten(&json!([null, [null]]), &keyword()).unwrap().is_empty());
    }

    #[test]
    fn test_opaque_leaf_follows_tolerance() {
        let tree = HostNode::List(vec![HostNode::Text("a".into()), HostNode::Handle("socket")]);

        let err = flatten(&tree, &keyword()).unwrap_err();
        assert!(matches!(err, IngotError::Malformed { ref value, .. } if value == "socket"));

        let lenient = keyword().with_ignore_malformed(true);
        assert_eq!(flatten(&tree, &lenient).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_visit_leaves_reports_opaque() {
        let tree = HostNode::Record(vec![("h".into(), HostNode::Handle("thread"))]);
        let mut leaves = Vec::new();
        visit_leaves(&tree, &mut |leaf| {
            leaves.push(format!("{leaf:?}"));
            Ok(())
        })
        .unwrap();
        assert_eq!(leaves, vec![r#"Opaque("thread")"#]);
    }
}
