//! Startup models and DTOs.
//!
//! A startup is the tracked business entity. The engine reads it as a flat
//! JSON field map (see [`Startup::field_map`]) so conditions and
//! placeholders address columns by name.

use dealflow_core::attributes::AttributeKind;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::audit_text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::startup_history::StartupHistory;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A startup row from the `startups` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Startup {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub ceo_name: Option<String>,
    pub ceo_email: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub status_id: DbId,
    pub priority: String,
    pub is_incorporated: bool,
    pub has_investment: bool,
    pub mrr: Option<f64>,
    pub tam: Option<f64>,
    pub sam: Option<f64>,
    pub som: Option<f64>,
    pub client_count: Option<i32>,
    pub employee_count: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Startup {
    /// Column-name keyed snapshot of the row.
    pub fn field_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a new startup. `priority` is normalized before insert.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStartup {
    pub name: String,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub ceo_name: Option<String>,
    pub ceo_email: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub status_id: DbId,
    pub priority: Option<String>,
    pub is_incorporated: Option<bool>,
    pub has_investment: Option<bool>,
    pub mrr: Option<f64>,
    pub tam: Option<f64>,
    pub sam: Option<f64>,
    pub som: Option<f64>,
    pub client_count: Option<i32>,
    pub employee_count: Option<i32>,
}

// ---------------------------------------------------------------------------
// Attribute writes
// ---------------------------------------------------------------------------

/// A coerced attribute value in the SQL type of its column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Bool(Option<bool>),
    Float(Option<f64>),
    Int(Option<i32>),
}

impl ColumnValue {
    /// Map a coerced JSON value onto the column type for `kind`.
    ///
    /// Returns `None` when the value cannot be stored in that column, e.g. a
    /// numeric attribute whose coercion fell back to unparseable text.
    pub fn from_json(kind: AttributeKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (AttributeKind::Text | AttributeKind::Priority, Value::Null) => {
                Some(Self::Text(None))
            }
            (AttributeKind::Text | AttributeKind::Priority, Value::String(s)) => {
                Some(Self::Text(Some(s.clone())))
            }
            (AttributeKind::Boolean, Value::Null) => Some(Self::Bool(None)),
            (AttributeKind::Boolean, Value::Bool(b)) => Some(Self::Bool(Some(*b))),
            (AttributeKind::Decimal, Value::Null) => Some(Self::Float(None)),
            (AttributeKind::Decimal, Value::Number(n)) => n.as_f64().map(|f| Self::Float(Some(f))),
            (AttributeKind::Integer, Value::Null) => Some(Self::Int(None)),
            (AttributeKind::Integer, Value::Number(n)) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(|i| Self::Int(Some(i))),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(v) => v.clone().map_or(Value::Null, Value::String),
            Self::Bool(v) => v.map_or(Value::Null, Value::Bool),
            Self::Float(v) => v.map_or(Value::Null, Value::from),
            Self::Int(v) => v.map_or(Value::Null, Value::from),
        }
    }

    /// Rendering for the general audit trail.
    pub fn audit_text(&self) -> String {
        audit_text(Some(&self.to_json()))
    }
}

/// Outcome of an audited attribute write.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeUpdate {
    pub startup: Startup,
    /// Value of the column before the write.
    pub previous: Value,
    pub history: StartupHistory,
}
