//! Compilation of segment rules into a storage predicate.
//!
//! Rules are processed in order and the first invalid rule aborts the whole
//! evaluation. When several rules name the same field the last one wins.

use crate::errors::{CatalogError, Result};
use crate::predicate::CompiledPredicate;
use crate::registry::FieldRegistry;
use crate::rule::Rule;
use serde_json::Value as JsonValue;

pub fn evaluate<S: AsRef<str>>(rules: &[S], registry: &FieldRegistry) -> Result<CompiledPredicate> {
    let mut predicate = CompiledPredicate::new();
    for text in rules {
        let rule = Rule::parse(text.as_ref(), registry)?;
        predicate.insert(rule.field, rule.comparison);
    }
    Ok(predicate)
}

/// Evaluate a raw request body of the form `{"rules": ["price > 10", ...]}`.
pub fn evaluate_request(body: &JsonValue, registry: &FieldRegistry) -> Result<CompiledPredicate> {
    let rules = body
        .get("rules")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| CatalogError::InvalidRequest("Rules must be an array".into()))?;
    let texts = rules
        .iter()
        .enumerate()
        .map(|(i, r)| {
            r.as_str().ok_or_else(|| {
                CatalogError::InvalidRequest(format!("Rule at index {} must be a string", i))
            })
        })
        .collect::<Result<Vec<&str>>>()?;
    evaluate(&texts, registry)
}
