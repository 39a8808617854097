//! Workflow engine entry points.
//!
//! Each `on_*` method handles one domain event end to end: resolve matching
//! workflows, gate them on their conditions, run their actions and log the
//! outcome. The methods never fail: problems are logged and reflected in the
//! returned summaries, so the mutation that raised the event stands.
//!
//! Writes made by actions do not raise further events.

use std::sync::Arc;

use chrono::Utc;
use dealflow_core::attributes::StartupAttribute;
use dealflow_core::types::DbId;
use dealflow_core::workflow::{ExecutionStatus, TriggerEvent};
use dealflow_db::models::startup::AttributeUpdate;
use dealflow_db::models::workflow::Workflow;
use dealflow_notify::MailTransport;
use serde_json::Value;

use crate::actions::attribute::apply_attribute_change;
use crate::actions::{ActionContext, ActionFailure};
use crate::config::EngineConfig;
use crate::gate::{check_conditions, GateDecision};
use crate::logger::{record_execution, ExecutionSummary};
use crate::resolver::resolve_workflows;
use crate::runner::run_actions;
use crate::store::{AutomationStore, StoreError};
use crate::target::TargetEntity;

pub struct WorkflowEngine {
    store: Arc<dyn AutomationStore>,
    mailer: Arc<dyn MailTransport>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn AutomationStore>,
        mailer: Arc<dyn MailTransport>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn AutomationStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// A startup entered `new_status_id`.
    pub async fn on_status_changed(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        acting_user: Option<DbId>,
    ) -> Vec<ExecutionSummary> {
        let event = TriggerEvent::StatusChanged {
            startup_id,
            new_status_id,
        };
        self.dispatch(event, acting_user).await
    }

    /// A startup field changed to `new_value`. `previous_value` is needed
    /// only by triggers that constrain the old value.
    pub async fn on_attribute_changed(
        &self,
        startup_id: DbId,
        field_name: &str,
        new_value: Value,
        previous_value: Option<Value>,
        acting_user: Option<DbId>,
    ) -> Vec<ExecutionSummary> {
        let event = TriggerEvent::AttributeChanged {
            startup_id,
            field_name: field_name.to_string(),
            old_value: previous_value,
            new_value,
        };
        self.dispatch(event, acting_user).await
    }

    /// A task was inserted. Runs target the task; the acting user is the
    /// task's creator.
    pub async fn on_task_created(&self, task_id: DbId) -> Vec<ExecutionSummary> {
        self.dispatch(TriggerEvent::TaskCreated { task_id }, None).await
    }

    /// Write a startup attribute with its audit record, then raise the
    /// attribute-change event.
    ///
    /// The write is authoritative and its failure is returned; the workflow
    /// runs that follow are advisory.
    pub async fn set_attribute(
        &self,
        startup_id: DbId,
        attribute: StartupAttribute,
        raw_value: &Value,
        acting_user: Option<DbId>,
    ) -> Result<(AttributeUpdate, Vec<ExecutionSummary>), ActionFailure> {
        let update = apply_attribute_change(
            self.store.as_ref(),
            startup_id,
            attribute,
            raw_value,
            acting_user,
            Utc::now(),
        )
        .await?;

        let new_value = update
            .startup
            .field_map()
            .remove(attribute.column())
            .unwrap_or(Value::Null);
        let summaries = self
            .on_attribute_changed(
                startup_id,
                attribute.column(),
                new_value,
                Some(update.previous.clone()),
                acting_user,
            )
            .await;
        Ok((update, summaries))
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    async fn dispatch(
        &self,
        event: TriggerEvent,
        acting_user: Option<DbId>,
    ) -> Vec<ExecutionSummary> {
        let (target, acting_user) = match self.load_target(&event, acting_user).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::warn!(?event, "Trigger entity not found, no workflows run");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(?event, error = %e, "Failed to load trigger entity");
                return Vec::new();
            }
        };

        let workflows = match resolve_workflows(self.store.as_ref(), &event).await {
            Ok(workflows) => workflows,
            Err(e) => {
                tracing::error!(?event, error = %e, "Failed to resolve workflows");
                return Vec::new();
            }
        };

        let mut summaries = Vec::with_capacity(workflows.len());
        for workflow in &workflows {
            summaries.push(self.run_workflow(workflow, &target, acting_user).await);
        }
        summaries
    }

    async fn load_target(
        &self,
        event: &TriggerEvent,
        acting_user: Option<DbId>,
    ) -> Result<Option<(TargetEntity, Option<DbId>)>, StoreError> {
        match event {
            TriggerEvent::StatusChanged { startup_id, .. }
            | TriggerEvent::AttributeChanged { startup_id, .. } => Ok(self
                .store
                .get_startup(*startup_id)
                .await?
                .map(|startup| (TargetEntity::from_startup(&startup), acting_user))),
            TriggerEvent::TaskCreated { task_id } => Ok(self
                .store
                .get_task(*task_id)
                .await?
                .map(|task| (TargetEntity::from_task(&task), acting_user.or(task.created_by)))),
        }
    }

    async fn run_workflow(
        &self,
        workflow: &Workflow,
        target: &TargetEntity,
        acting_user: Option<DbId>,
    ) -> ExecutionSummary {
        let store = self.store.as_ref();

        match check_conditions(store, workflow.id, target).await {
            Ok(GateDecision::Pass) => {}
            Ok(GateDecision::Blocked { condition_id, reason }) => {
                tracing::debug!(workflow_id = workflow.id, condition_id, %reason, "Workflow skipped");
                return record_execution(
                    store,
                    workflow,
                    target,
                    ExecutionStatus::Skipped,
                    Vec::new(),
                    Some(reason),
                    self.config.log_skipped,
                )
                .await;
            }
            Err(e) => {
                return record_execution(
                    store,
                    workflow,
                    target,
                    ExecutionStatus::Error,
                    Vec::new(),
                    Some(format!("Failed to load conditions: {e}")),
                    true,
                )
                .await;
            }
        }

        let actions = match store.list_actions(workflow.id).await {
            Ok(actions) => actions,
            Err(e) => {
                return record_execution(
                    store,
                    workflow,
                    target,
                    ExecutionStatus::Error,
                    Vec::new(),
                    Some(format!("Failed to load actions: {e}")),
                    true,
                )
                .await;
            }
        };

        let ctx = ActionContext {
            store,
            mailer: self.mailer.as_ref(),
            acting_user,
            now: Utc::now(),
        };
        let results = run_actions(&actions, target, &ctx, self.config.action_timeout).await;
        let status = ExecutionStatus::from_results(&results);
        let error_message = match status {
            ExecutionStatus::Success => None,
            _ => Some(format!(
                "{} of {} actions failed",
                results.iter().filter(|r| !r.success).count(),
                results.len()
            )),
        };

        record_execution(store, workflow, target, status, results, error_message, true).await
    }
}
