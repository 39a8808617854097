//! Workflow condition rows.

use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::stringify;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A condition row from the `workflow_conditions` table.
///
/// `operator` and `value` are stored as text; the operator is parsed when
/// the condition is evaluated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct WorkflowCondition {
    pub id: DbId,
    pub workflow_id: DbId,
    pub field_name: String,
    pub operator: String,
    pub value: String,
    pub created_at: Timestamp,
}

/// Input for one condition of a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowCondition {
    pub field_name: String,
    pub operator: String,
    /// Any JSON scalar; stored as its text rendering.
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub value: String,
}

fn scalar_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(stringify(&value))
}
