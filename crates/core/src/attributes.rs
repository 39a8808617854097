//! Entity field registries and attribute coercion.
//!
//! Workflows may only reference fields that exist on the entity their
//! trigger targets, and attribute-change actions may only write the
//! startup columns listed in [`StartupAttribute`]. Each writable attribute
//! carries an [`AttributeKind`] that drives value coercion before the write.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::CoreError;
use crate::priority::Priority;
use crate::values::{parse_number, stringify};

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Kind of entity a workflow run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Startup,
    Task,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Task => "task",
        }
    }

    /// Whether `field` names a column on this entity.
    pub fn has_field(&self, field: &str) -> bool {
        match self {
            Self::Startup => STARTUP_FIELDS.contains(&field),
            Self::Task => TASK_FIELDS.contains(&field),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every readable startup field (conditions and placeholders).
pub const STARTUP_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "sector",
    "ceo_name",
    "ceo_email",
    "contact_email",
    "website",
    "city",
    "status_id",
    "priority",
    "is_incorporated",
    "has_investment",
    "mrr",
    "tam",
    "sam",
    "som",
    "client_count",
    "employee_count",
    "created_at",
    "updated_at",
];

/// Every readable task field.
pub const TASK_FIELDS: &[&str] = &[
    "id",
    "startup_id",
    "title",
    "description",
    "status",
    "priority",
    "due_date",
    "assignee_id",
    "created_by",
    "created_at",
    "updated_at",
];

// ---------------------------------------------------------------------------
// StartupAttribute
// ---------------------------------------------------------------------------

/// How a writable attribute's value is coerced before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Text,
    Boolean,
    Priority,
    Decimal,
    Integer,
}

/// A startup column that attribute-change actions are allowed to write.
///
/// `status_id` is deliberately absent: status moves only through the
/// status-history transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAttribute {
    Name,
    Description,
    Sector,
    CeoName,
    CeoEmail,
    ContactEmail,
    Website,
    City,
    Priority,
    IsIncorporated,
    HasInvestment,
    Mrr,
    Tam,
    Sam,
    Som,
    ClientCount,
    EmployeeCount,
}

impl StartupAttribute {
    /// Column name in the `startups` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Sector => "sector",
            Self::CeoName => "ceo_name",
            Self::CeoEmail => "ceo_email",
            Self::ContactEmail => "contact_email",
            Self::Website => "website",
            Self::City => "city",
            Self::Priority => "priority",
            Self::IsIncorporated => "is_incorporated",
            Self::HasInvestment => "has_investment",
            Self::Mrr => "mrr",
            Self::Tam => "tam",
            Self::Sam => "sam",
            Self::Som => "som",
            Self::ClientCount => "client_count",
            Self::EmployeeCount => "employee_count",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::IsIncorporated | Self::HasInvestment => AttributeKind::Boolean,
            Self::Priority => AttributeKind::Priority,
            Self::Mrr | Self::Tam | Self::Sam | Self::Som => AttributeKind::Decimal,
            Self::ClientCount | Self::EmployeeCount => AttributeKind::Integer,
            _ => AttributeKind::Text,
        }
    }

    /// Whether the column accepts `null`.
    pub fn nullable(&self) -> bool {
        !matches!(
            self,
            Self::Name | Self::Priority | Self::IsIncorporated | Self::HasInvestment
        )
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "sector" => Ok(Self::Sector),
            "ceo_name" => Ok(Self::CeoName),
            "ceo_email" => Ok(Self::CeoEmail),
            "contact_email" => Ok(Self::ContactEmail),
            "website" => Ok(Self::Website),
            "city" => Ok(Self::City),
            "priority" => Ok(Self::Priority),
            "is_incorporated" => Ok(Self::IsIncorporated),
            "has_investment" => Ok(Self::HasInvestment),
            "mrr" => Ok(Self::Mrr),
            "tam" => Ok(Self::Tam),
            "sam" => Ok(Self::Sam),
            "som" => Ok(Self::Som),
            "client_count" => Ok(Self::ClientCount),
            "employee_count" => Ok(Self::EmployeeCount),
            _ => Err(CoreError::Validation(format!(
                "'{s}' is not a writable startup attribute"
            ))),
        }
    }
}

impl std::fmt::Display for StartupAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerce a raw value to the shape its attribute is stored as.
///
/// - boolean: native booleans or `"true"` / `"false"` (case-insensitive)
/// - priority: normalized via [`Priority::normalize`]
/// - decimal / integer: numeric parse, falling back to the raw value
/// - text: scalars are rendered as text
///
/// Priority is total: anything, `null` included, normalizes to a level.
/// Otherwise `null` passes through for nullable columns and is rejected for
/// the rest, as is an unrecognised boolean. Numeric fallbacks surface later
/// as a write error.
pub fn coerce_attribute(attribute: StartupAttribute, value: &Value) -> Result<Value, CoreError> {
    if value.is_null() && attribute.kind() != AttributeKind::Priority {
        return if attribute.nullable() {
            Ok(Value::Null)
        } else {
            Err(CoreError::Validation(format!("{attribute} cannot be empty")))
        };
    }

    match attribute.kind() {
        AttributeKind::Text => Ok(match value {
            Value::String(_) => value.clone(),
            other => Value::String(stringify(other)),
        }),
        AttributeKind::Boolean => coerce_boolean(attribute, value),
        AttributeKind::Priority => Ok(Value::String(
            Priority::from_value(value).as_str().to_string(),
        )),
        AttributeKind::Decimal => Ok(coerce_decimal(value)),
        AttributeKind::Integer => Ok(coerce_integer(value)),
    }
}

fn coerce_boolean(attribute: StartupAttribute, value: &Value) -> Result<Value, CoreError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(CoreError::Validation(format!(
            "'{}' is not a boolean value for {attribute}",
            stringify(other)
        ))),
    }
}

fn coerce_decimal(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => parse_number(s)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

fn coerce_integer(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => return value.clone(),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };
    match parsed {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
        _ => value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
