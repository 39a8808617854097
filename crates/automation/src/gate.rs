//! Condition gate: every condition of a workflow must hold.

use dealflow_core::conditions::{evaluate_condition, ConditionOperator};
use dealflow_core::types::DbId;
use dealflow_db::models::workflow_condition::WorkflowCondition;

use crate::store::{AutomationStore, StoreError};
use crate::target::TargetEntity;

/// Outcome of checking a workflow's conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    /// The first condition that did not hold.
    Blocked { condition_id: DbId, reason: String },
}

/// Load and evaluate a workflow's conditions against `target`.
pub async fn check_conditions(
    store: &dyn AutomationStore,
    workflow_id: DbId,
    target: &TargetEntity,
) -> Result<GateDecision, StoreError> {
    let conditions = store.list_conditions(workflow_id).await?;
    Ok(evaluate_conditions(&conditions, target))
}

/// AND over `conditions`, short-circuiting on the first failure. An empty
/// list passes.
pub fn evaluate_conditions(conditions: &[WorkflowCondition], target: &TargetEntity) -> GateDecision {
    for condition in conditions {
        let operator = match ConditionOperator::from_str(&condition.operator) {
            Ok(op) => op,
            Err(_) => {
                tracing::warn!(
                    condition_id = condition.id,
                    workflow_id = condition.workflow_id,
                    operator = %condition.operator,
                    "Unknown condition operator, treating condition as failed",
                );
                return GateDecision::Blocked {
                    condition_id: condition.id,
                    reason: format!("unknown operator '{}'", condition.operator),
                };
            }
        };

        if !evaluate_condition(target.field(&condition.field_name), operator, &condition.value) {
            return GateDecision::Blocked {
                condition_id: condition.id,
                reason: format!(
                    "condition not met: {} {} '{}'",
                    condition.field_name, operator, condition.value
                ),
            };
        }
    }
    GateDecision::Pass
}
