//! Entity-field placeholder substitution for action templates.
//!
//! Email subjects/bodies and task titles/descriptions may reference fields of
//! the triggering entity as `{field_name}` or `{{field_name}}`. Known fields
//! are replaced with their textual rendering; unknown placeholders are left
//! verbatim so a typo stays visible in the output.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::values::stringify;

/// Regex pattern matching `{{field}}` (tried first) or `{field}` tokens.
pub const PLACEHOLDER_PATTERN: &str =
    r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Replace every placeholder whose field exists in `fields`.
pub fn substitute_placeholders(template: &str, fields: &Map<String, Value>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match fields.get(name) {
                Some(value) => stringify(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
