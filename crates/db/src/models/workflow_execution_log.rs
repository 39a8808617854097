//! Workflow execution log rows. One per run, never updated.

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `workflow_execution_logs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct WorkflowExecutionLog {
    pub id: DbId,
    pub workflow_id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub status: String,
    /// Array of per-action result records.
    pub results: serde_json::Value,
    pub error_message: Option<String>,
    pub executed_at: Timestamp,
}

/// Input for recording a run.
#[derive(Debug, Clone)]
pub struct CreateWorkflowExecutionLog {
    pub workflow_id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub status: String,
    pub results: serde_json::Value,
    pub error_message: Option<String>,
}

/// Pagination for log listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionLogFilter {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
