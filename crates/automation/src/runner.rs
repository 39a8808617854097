//! Runs a workflow's actions in order, continuing past failures.

use std::time::{Duration, Instant};

use dealflow_core::actions::{ActionDetails, ActionType};
use dealflow_core::workflow::ActionResult;
use dealflow_db::models::workflow_action::WorkflowAction;

use crate::actions::{execute, ActionContext, ActionFailure};
use crate::target::TargetEntity;

/// Execute `actions` in the given order, each bounded by `timeout`.
///
/// Returns one result per action. A failed, misconfigured or timed-out
/// action is recorded and the next action still runs.
pub async fn run_actions(
    actions: &[WorkflowAction],
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
    timeout: Duration,
) -> Vec<ActionResult> {
    let mut results = Vec::with_capacity(actions.len());

    for action in actions {
        let start = Instant::now();

        let outcome = match parse_action(action) {
            Ok(details) => match tokio::time::timeout(timeout, execute(&details, target, ctx)).await
            {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(ActionFailure::Timeout(timeout)),
            },
            Err(failure) => Err(failure),
        };
        let duration_ms = start.elapsed().as_millis() as i64;

        let result = match outcome {
            Ok(output) => {
                tracing::debug!(
                    action_id = action.id,
                    action_type = %action.action_type,
                    duration_ms,
                    "Workflow action succeeded",
                );
                ActionResult {
                    action_id: action.id,
                    action_name: action.name.clone(),
                    action_type: action.action_type.clone(),
                    success: true,
                    message: output.message,
                    data: output.data,
                    duration_ms,
                }
            }
            Err(failure) => {
                tracing::warn!(
                    action_id = action.id,
                    workflow_id = action.workflow_id,
                    action_type = %action.action_type,
                    error = %failure,
                    "Workflow action failed",
                );
                ActionResult {
                    action_id: action.id,
                    action_name: action.name.clone(),
                    action_type: action.action_type.clone(),
                    success: false,
                    message: failure.to_string(),
                    data: None,
                    duration_ms,
                }
            }
        };
        results.push(result);
    }

    results
}

fn parse_action(action: &WorkflowAction) -> Result<ActionDetails, ActionFailure> {
    ActionType::from_str(&action.action_type)
        .and_then(|action_type| ActionDetails::parse(action_type, &action.action_details))
        .map_err(|e| ActionFailure::Misconfigured(e.to_string()))
}
