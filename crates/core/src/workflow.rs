//! Workflow triggers, trigger matching and execution outcomes.
//!
//! A workflow pairs a [`TriggerType`] with semi-structured trigger details.
//! The details are parsed into the [`TriggerDetails`] sum type when a
//! workflow is created or updated, and again when the engine resolves
//! candidates for a [`TriggerEvent`]; rows that no longer parse never match.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{coerce_attribute, EntityType, StartupAttribute};
use crate::error::CoreError;
use crate::types::DbId;
use crate::values::stringify;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a workflow name.
pub const MAX_WORKFLOW_NAME_LENGTH: usize = 200;

/// Maximum number of conditions on one workflow.
pub const MAX_CONDITIONS_PER_WORKFLOW: usize = 50;

/// Maximum number of actions on one workflow.
pub const MAX_ACTIONS_PER_WORKFLOW: usize = 50;

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

/// The domain event class that makes a workflow eligible to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    StatusChange,
    AttributeChange,
    TaskCreation,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChange => "status_change",
            Self::AttributeChange => "attribute_change",
            Self::TaskCreation => "task_creation",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "status_change" => Ok(Self::StatusChange),
            "attribute_change" => Ok(Self::AttributeChange),
            "task_creation" => Ok(Self::TaskCreation),
            _ => Err(CoreError::Validation(format!(
                "Invalid trigger_type: '{s}'. Must be one of: status_change, \
                 attribute_change, task_creation"
            ))),
        }
    }

    /// The entity a run of this trigger is evaluated against.
    pub fn target_entity(&self) -> EntityType {
        match self {
            Self::StatusChange | Self::AttributeChange => EntityType::Startup,
            Self::TaskCreation => EntityType::Task,
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

/// A domain mutation reported to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    StatusChanged {
        startup_id: DbId,
        new_status_id: DbId,
    },
    AttributeChanged {
        startup_id: DbId,
        field_name: String,
        old_value: Option<Value>,
        new_value: Value,
    },
    TaskCreated {
        task_id: DbId,
    },
}

impl TriggerEvent {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::StatusChanged { .. } => TriggerType::StatusChange,
            Self::AttributeChanged { .. } => TriggerType::AttributeChange,
            Self::TaskCreated { .. } => TriggerType::TaskCreation,
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerDetails
// ---------------------------------------------------------------------------

/// Parsed trigger filter, one variant per [`TriggerType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerDetails {
    /// Fires when the startup enters any of `status_ids`.
    StatusChange { status_ids: Vec<DbId> },
    /// Fires when `field_name` changes; optional old/new constraints are
    /// stored in the attribute's canonical form and compared textually.
    AttributeChange {
        field_name: String,
        old_value: Option<String>,
        new_value: Option<String>,
    },
    TaskCreation,
}

impl TriggerDetails {
    /// Parse and validate the JSON details stored for `trigger_type`.
    ///
    /// - `status_change`: `{"status_id": 3}` or `{"status_ids": [3, 4]}`
    /// - `attribute_change`: `{"field_name": "sector", "old_value"?, "new_value"?}`
    /// - `task_creation`: `{}` or `null`
    pub fn parse(trigger_type: TriggerType, details: &Value) -> Result<Self, CoreError> {
        if trigger_type == TriggerType::TaskCreation {
            return match details {
                Value::Null | Value::Object(_) => Ok(Self::TaskCreation),
                _ => Err(CoreError::Validation(
                    "trigger_details must be a JSON object".to_string(),
                )),
            };
        }

        let obj = details.as_object().ok_or_else(|| {
            CoreError::Validation("trigger_details must be a JSON object".to_string())
        })?;

        match trigger_type {
            TriggerType::StatusChange => {
                let mut status_ids = Vec::new();
                if let Some(single) = obj.get("status_id").filter(|v| !v.is_null()) {
                    status_ids.push(parse_id(single)?);
                }
                if let Some(many) = obj.get("status_ids").filter(|v| !v.is_null()) {
                    let items = many.as_array().ok_or_else(|| {
                        CoreError::Validation("status_ids must be an array".to_string())
                    })?;
                    for item in items {
                        status_ids.push(parse_id(item)?);
                    }
                }
                if status_ids.is_empty() {
                    return Err(CoreError::Validation(
                        "status_change trigger must name at least one status".to_string(),
                    ));
                }
                status_ids.sort_unstable();
                status_ids.dedup();
                Ok(Self::StatusChange { status_ids })
            }
            TriggerType::AttributeChange => {
                let field_name = obj
                    .get("field_name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation(
                            "attribute_change trigger must contain 'field_name'".to_string(),
                        )
                    })?;
                if !EntityType::Startup.has_field(field_name) {
                    return Err(CoreError::Validation(format!(
                        "'{field_name}' is not a startup field"
                    )));
                }
                Ok(Self::AttributeChange {
                    field_name: field_name.to_string(),
                    old_value: constraint_text(field_name, obj.get("old_value"))?,
                    new_value: constraint_text(field_name, obj.get("new_value"))?,
                })
            }
            TriggerType::TaskCreation => Ok(Self::TaskCreation),
        }
    }

    /// Whether this filter accepts `event`. Events of another trigger type
    /// never match.
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        match (self, event) {
            (
                Self::StatusChange { status_ids },
                TriggerEvent::StatusChanged { new_status_id, .. },
            ) => status_ids.contains(new_status_id),
            (
                Self::AttributeChange {
                    field_name,
                    old_value,
                    new_value,
                },
                TriggerEvent::AttributeChanged {
                    field_name: changed,
                    old_value: actual_old,
                    new_value: actual_new,
                    ..
                },
            ) => {
                if field_name != changed {
                    return false;
                }
                let old_ok = match old_value {
                    None => true,
                    Some(expected) => actual_old
                        .as_ref()
                        .is_some_and(|v| stringify(v) == *expected),
                };
                let new_ok = match new_value {
                    None => true,
                    Some(expected) => stringify(actual_new) == *expected,
                };
                old_ok && new_ok
            }
            (Self::TaskCreation, TriggerEvent::TaskCreated { .. }) => true,
            _ => false,
        }
    }
}

fn parse_id(value: &Value) -> Result<DbId, CoreError> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<DbId>().ok(),
        _ => None,
    };
    id.ok_or_else(|| CoreError::Validation(format!("'{value}' is not a valid status id")))
}

/// Render a value constraint the way the written attribute will read, so
/// `"alta"` on `priority` compares as `"high"`.
fn constraint_text(field_name: &str, value: Option<&Value>) -> Result<Option<String>, CoreError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    match StartupAttribute::from_str(field_name) {
        Ok(attribute) => Ok(Some(stringify(&coerce_attribute(attribute, value)?))),
        Err(_) => Ok(Some(stringify(value))),
    }
}

// ---------------------------------------------------------------------------
// Execution outcome
// ---------------------------------------------------------------------------

/// Outcome of one action within a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: DbId,
    pub action_name: String,
    pub action_type: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub duration_ms: i64,
}

/// Overall status recorded in a workflow execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    PartialSuccess,
    Error,
    Skipped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    /// Derive the run status from its per-action results.
    ///
    /// A run with no actions has nothing to fail and counts as success.
    pub fn from_results(results: &[ActionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        if succeeded == results.len() {
            Self::Success
        } else if succeeded > 0 {
            Self::PartialSuccess
        } else {
            Self::Error
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a workflow name: must be non-empty and within length limit.
pub fn validate_workflow_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Workflow name must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_WORKFLOW_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Workflow name exceeds maximum length of {MAX_WORKFLOW_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate that a condition references a field of the trigger's target
/// entity.
pub fn validate_condition_field(trigger_type: TriggerType, field_name: &str) -> Result<(), CoreError> {
    let entity = trigger_type.target_entity();
    if entity.has_field(field_name) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Condition field '{field_name}' does not exist on {entity}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
