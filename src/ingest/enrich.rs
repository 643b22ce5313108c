//! Enrichment hooks.
//!
//! Enrichers run after the source tree has been collected. They read the
//! aggregate buffer (the space-joined values of every field flagged
//! `include_in_aggregate`) and contribute derived field values, which go
//! through the same coercion and accumulation as source values.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::schema::Field;

/// A derived value for a field.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub field: Arc<Field>,
    pub value: String,
}

impl Contribution {
    pub fn new(field: &Arc<Field>, value: impl Into<String>) -> Self {
        Contribution {
            field: Arc::clone(field),
            value: value.into(),
        }
    }
}

/// A pluggable enrichment step.
///
/// Enrichers run sequentially in configuration order. Each one sees the
/// contributions of the enrichers before it appended to the aggregate buffer.
pub trait Enricher: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether this enricher reads the aggregate buffer. When no configured
    /// enricher does, the buffer is never assembled.
    fn needs_aggregate(&self) -> bool {
        true
    }

    fn enrich(&self, aggregate: &str) -> anyhow::Result<Vec<Contribution>>;
}

/// Contributes the number of whitespace-separated tokens in the aggregate.
#[derive(Debug, Clone)]
pub struct TokenCountEnricher {
    field: Arc<Field>,
}

impl TokenCountEnricher {
    pub fn new(field: Arc<Field>) -> Self {
        TokenCountEnricher { field }
    }
}

impl Enricher for TokenCountEnricher {
    fn name(&self) -> &str {
        "token_count"
    }

    fn enrich(&self, aggregate: &str) -> anyhow::Result<Vec<Contribution>> {
        let count = aggregate.split_whitespace().count();
        Ok(vec![Contribution::new(&self.field, count.to_string())])
    }
}

/// Contributes every match of a pattern found in the aggregate.
#[derive(Debug, Clone)]
pub struct RegexExtractEnricher {
    field: Arc<Field>,
    pattern: Regex,
}

impl RegexExtractEnricher {
    pub fn new(field: Arc<Field>, pattern: Regex) -> Self {
        RegexExtractEnricher { field, pattern }
    }
}

impl Enricher for RegexExtractEnricher {
    fn name(&self) -> &str {
        "regex_extract"
    }

    fn enrich(&self, aggregate: &str) -> anyhow::Result<Vec<Contribution>> {
        Ok(self
            .pattern
            .find_iter(aggregate)
            .map(|m| Contribution::new(&self.field, m.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_token_count() {
        let field = Arc::new(Field::new("words", FieldType::Integer));
        let contributions = TokenCountEnricher::new(field).enrich("the  quick\nfox").unwrap();
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].value, "3");
    }

    #[test]
    fn test_regex_extract() {
        let field = Arc::new(Field::new("hashtags", FieldType::Keyword));
        let enricher = RegexExtractEnricher::new(field, Regex::new(r"#\w+").unwrap());
        let values: Vec<String> = enricher
            .enrich("loving #rust and #serde, #rust again")
            .unwrap()
            .into_iter()
            .map(|c| c.value)
            .collect();
        assert_eq!(values, vec!["#rust", "#serde", "#rust"]);
        assert!(enricher.needs_aggregate());
    }
}
