//! Loose conversions between JSON field values, text and numbers.
//!
//! Entity snapshots travel through the engine as `serde_json` maps, so every
//! comparison, template substitution and audit record goes through these
//! helpers to get a consistent textual rendering.

use serde_json::{Number, Value};

/// Audit-trail sentinel for a value that is absent, null or empty.
pub const NOT_DEFINED: &str = "Not defined";

/// Render a field value as text.
///
/// Strings are returned verbatim, `null` becomes the empty string, integral
/// floats drop their fractional part (`1500.0` renders as `1500`) and
/// arrays/objects fall back to compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    }
}

/// Render a value for the general audit trail, substituting [`NOT_DEFINED`]
/// for missing, null and empty values.
pub fn audit_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_DEFINED.to_string(),
        Some(Value::String(s)) if s.is_empty() => NOT_DEFINED.to_string(),
        Some(v) => stringify(v),
    }
}

/// Interpret a value as a number: JSON numbers directly, strings via a
/// trimmed float parse. Everything else yields `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a trimmed, non-empty string as a finite float.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stringify_scalars() {
        assert_eq!(stringify(&json!("Maria")), "Maria");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(1500.0)), "1500");
        assert_eq!(stringify(&json!(12.5)), "12.5");
    }

    #[test]
    fn stringify_composites_as_json() {
        assert_eq!(stringify(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn audit_text_uses_sentinel_for_missing_values() {
        assert_eq!(audit_text(None), NOT_DEFINED);
        assert_eq!(audit_text(Some(&json!(null))), NOT_DEFINED);
        assert_eq!(audit_text(Some(&json!(""))), NOT_DEFINED);
        assert_eq!(audit_text(Some(&json!(0))), "0");
        assert_eq!(audit_text(Some(&json!("high"))), "high");
    }

    #[test]
    fn as_number_parses_numeric_strings() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!("")), None);
        assert_eq!(as_number(&json!(true)), None);
    }
}
