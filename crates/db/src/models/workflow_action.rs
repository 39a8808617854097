//! Workflow action rows.

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An action row from the `workflow_actions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub id: DbId,
    pub workflow_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub action_type: String,
    pub action_details: serde_json::Value,
    pub execution_order: i32,
    pub created_at: Timestamp,
}

/// Input for one action of a workflow.
///
/// When `execution_order` is omitted the action's position in the list is
/// used.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowAction {
    pub name: String,
    pub description: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub action_details: serde_json::Value,
    pub execution_order: Option<i32>,
}
