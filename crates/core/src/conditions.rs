//! Workflow condition operators and the condition evaluator.
//!
//! A condition compares one field of the triggering entity against a
//! comparison value stored as text. When the field holds a number the
//! comparison value is coerced to a number first; otherwise comparisons are
//! textual. Evaluation is pure and never fails: a value that cannot be
//! compared simply does not satisfy the condition.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::values::{parse_number, stringify};

// ---------------------------------------------------------------------------
// ConditionOperator
// ---------------------------------------------------------------------------

/// Comparison operator of a workflow condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            _ => Err(CoreError::Validation(format!(
                "Invalid operator: '{s}'. Must be one of: equals, not_equals, contains, \
                 greater_than, less_than"
            ))),
        }
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a single condition against a field value.
///
/// `field` is `None` when the entity has no such field. Missing and null
/// fields only satisfy `not_equals`.
pub fn evaluate_condition(
    field: Option<&Value>,
    operator: ConditionOperator,
    expected: &str,
) -> bool {
    let field = match field {
        None | Some(Value::Null) => return operator == ConditionOperator::NotEquals,
        Some(v) => v,
    };

    match operator {
        ConditionOperator::Equals => loose_equals(field, expected),
        ConditionOperator::NotEquals => !loose_equals(field, expected),
        ConditionOperator::Contains => contains(field, expected),
        ConditionOperator::GreaterThan => compare(field, expected) == Some(Ordering::Greater),
        ConditionOperator::LessThan => compare(field, expected) == Some(Ordering::Less),
    }
}

fn loose_equals(field: &Value, expected: &str) -> bool {
    match field {
        Value::Number(n) => match (n.as_f64(), parse_number(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => expected.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        other => stringify(other) == expected,
    }
}

fn contains(field: &Value, expected: &str) -> bool {
    match field {
        Value::Array(items) => items.iter().any(|item| stringify(item) == expected),
        other => stringify(other).contains(expected),
    }
}

/// Order `field` relative to `expected`: numerically when the field is a
/// number (or both sides parse as numbers), lexically for other strings.
fn compare(field: &Value, expected: &str) -> Option<Ordering> {
    match field {
        Value::Number(n) => n.as_f64()?.partial_cmp(&parse_number(expected)?),
        Value::String(s) => match (parse_number(s), parse_number(expected)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => Some(s.as_str().cmp(expected)),
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
