//! Workflow models and DTOs.
//!
//! A workflow row holds the trigger; its conditions and actions live in
//! child tables and are written together with it (see `WorkflowRepo`).

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::workflow_action::{CreateWorkflowAction, WorkflowAction};
use super::workflow_condition::{CreateWorkflowCondition, WorkflowCondition};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A workflow row from the `workflows` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Workflow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub trigger_type: String,
    pub trigger_details: serde_json::Value,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A workflow together with its conditions and ordered actions.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub conditions: Vec<WorkflowCondition>,
    pub actions: Vec<WorkflowAction>,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a workflow with its conditions and actions.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub trigger_type: String,
    #[serde(default)]
    pub trigger_details: serde_json::Value,
    pub created_by: Option<DbId>,
    #[serde(default)]
    pub conditions: Vec<CreateWorkflowCondition>,
    #[serde(default)]
    pub actions: Vec<CreateWorkflowAction>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Input for updating a workflow. `None` leaves a field unchanged; a
/// provided `conditions` or `actions` list replaces the stored one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub trigger_type: Option<String>,
    pub trigger_details: Option<serde_json::Value>,
    pub conditions: Option<Vec<CreateWorkflowCondition>>,
    pub actions: Option<Vec<CreateWorkflowAction>>,
}

// ---------------------------------------------------------------------------
// Query filter
// ---------------------------------------------------------------------------

/// Query parameters for listing workflows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowFilter {
    pub trigger_type: Option<String>,
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
