//! Execution log: one record per workflow run.

use dealflow_core::types::DbId;
use dealflow_core::workflow::{ActionResult, ExecutionStatus};
use dealflow_db::models::workflow::Workflow;
use dealflow_db::models::workflow_execution_log::CreateWorkflowExecutionLog;
use serde::Serialize;

use crate::store::AutomationStore;
use crate::target::TargetEntity;

/// What happened when one workflow ran (or was skipped) for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub workflow_id: DbId,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub results: Vec<ActionResult>,
    pub error_message: Option<String>,
    /// Id of the persisted log row; `None` if no log was written.
    pub log_id: Option<DbId>,
}

/// Build the summary and, when `persist` is set, write the log row.
///
/// A failed log write is reported and otherwise ignored: logging must not
/// turn a completed run into a failure.
pub async fn record_execution(
    store: &dyn AutomationStore,
    workflow: &Workflow,
    target: &TargetEntity,
    status: ExecutionStatus,
    results: Vec<ActionResult>,
    error_message: Option<String>,
    persist: bool,
) -> ExecutionSummary {
    let mut summary = ExecutionSummary {
        workflow_id: workflow.id,
        workflow_name: workflow.name.clone(),
        status,
        results,
        error_message,
        log_id: None,
    };

    tracing::info!(
        workflow_id = workflow.id,
        entity_type = %target.entity_type,
        entity_id = target.id,
        status = %status,
        actions = summary.results.len(),
        "Workflow execution finished",
    );

    if !persist {
        return summary;
    }

    let input = CreateWorkflowExecutionLog {
        workflow_id: workflow.id,
        entity_type: target.entity_type.as_str().to_string(),
        entity_id: target.id,
        status: status.as_str().to_string(),
        results: serde_json::to_value(&summary.results).unwrap_or_default(),
        error_message: summary.error_message.clone(),
    };
    match store.insert_execution_log(&input).await {
        Ok(log) => summary.log_id = Some(log.id),
        Err(e) => {
            tracing::error!(
                workflow_id = workflow.id,
                error = %e,
                "Failed to write workflow execution log",
            );
        }
    }
    summary
}
