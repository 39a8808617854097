//! Selects the active workflows whose trigger accepts an event.

use dealflow_core::workflow::{TriggerDetails, TriggerEvent};
use dealflow_db::models::workflow::Workflow;

use crate::store::{AutomationStore, StoreError};

/// Active workflows of the event's trigger type whose trigger details match
/// it, in storage order.
///
/// Definitions whose details no longer parse are skipped: they can never
/// match, and rejecting them is the job of workflow creation.
pub async fn resolve_workflows(
    store: &dyn AutomationStore,
    event: &TriggerEvent,
) -> Result<Vec<Workflow>, StoreError> {
    let trigger_type = event.trigger_type();
    let workflows = store.list_active_workflows(trigger_type).await?;

    let matched = workflows
        .into_iter()
        .filter(|workflow| match TriggerDetails::parse(trigger_type, &workflow.trigger_details) {
            Ok(details) => details.matches(event),
            Err(e) => {
                tracing::debug!(
                    workflow_id = workflow.id,
                    error = %e,
                    "Skipping workflow with malformed trigger details",
                );
                false
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        trigger_type = %trigger_type,
        matched = matched.len(),
        "Workflows resolved",
    );
    Ok(matched)
}
