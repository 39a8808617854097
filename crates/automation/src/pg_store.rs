//! PostgreSQL-backed [`AutomationStore`].

use async_trait::async_trait;
use dealflow_core::attributes::StartupAttribute;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::stringify;
use dealflow_core::workflow::TriggerType;
use dealflow_db::models::startup::{AttributeUpdate, ColumnValue, CreateStartup, Startup};
use dealflow_db::models::startup_status_history::{StartupStatusHistory, StatusTransition};
use dealflow_db::models::status::Status;
use dealflow_db::models::task::{CreateTask, Task};
use dealflow_db::models::workflow::Workflow;
use dealflow_db::models::workflow_action::WorkflowAction;
use dealflow_db::models::workflow_condition::WorkflowCondition;
use dealflow_db::models::workflow_execution_log::{
    CreateWorkflowExecutionLog, WorkflowExecutionLog,
};
use dealflow_db::repositories::{
    StartupRepo, StartupStatusHistoryRepo, StatusRepo, TaskRepo, WorkflowActionRepo,
    WorkflowConditionRepo, WorkflowExecutionLogRepo, WorkflowRepo,
};
use serde_json::Value;
use sqlx::PgPool;

use crate::store::{AutomationStore, StoreError};

/// Delegates every operation to the `dealflow-db` repositories.
#[derive(Clone)]
pub struct PgAutomationStore {
    pool: PgPool,
}

impl PgAutomationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AutomationStore for PgAutomationStore {
    async fn get_startup(&self, id: DbId) -> Result<Option<Startup>, StoreError> {
        Ok(StartupRepo::find_by_id(&self.pool, id).await?)
    }

    async fn get_task(&self, id: DbId) -> Result<Option<Task>, StoreError> {
        Ok(TaskRepo::find_by_id(&self.pool, id).await?)
    }

    async fn resolve_status(&self, id: DbId) -> Result<Option<Status>, StoreError> {
        Ok(StatusRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update_startup_attribute(
        &self,
        startup_id: DbId,
        attribute: StartupAttribute,
        value: &Value,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<AttributeUpdate>, StoreError> {
        let column_value = ColumnValue::from_json(attribute.kind(), value).ok_or_else(|| {
            StoreError::InvalidValue {
                attribute,
                value: stringify(value),
            }
        })?;
        Ok(StartupRepo::update_attribute(
            &self.pool,
            startup_id,
            attribute,
            &column_value,
            changed_by,
            at,
        )
        .await?)
    }

    async fn insert_task(&self, input: &CreateTask) -> Result<Task, StoreError> {
        Ok(TaskRepo::create(&self.pool, input).await?)
    }

    async fn list_active_workflows(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<Workflow>, StoreError> {
        Ok(WorkflowRepo::list_active_by_trigger(&self.pool, trigger_type.as_str()).await?)
    }

    async fn list_conditions(&self, workflow_id: DbId) -> Result<Vec<WorkflowCondition>, StoreError> {
        Ok(WorkflowConditionRepo::list_for_workflow(&self.pool, workflow_id).await?)
    }

    async fn list_actions(&self, workflow_id: DbId) -> Result<Vec<WorkflowAction>, StoreError> {
        Ok(WorkflowActionRepo::list_for_workflow(&self.pool, workflow_id).await?)
    }

    async fn insert_execution_log(
        &self,
        input: &CreateWorkflowExecutionLog,
    ) -> Result<WorkflowExecutionLog, StoreError> {
        Ok(WorkflowExecutionLogRepo::create(&self.pool, input).await?)
    }

    async fn create_startup(
        &self,
        input: &CreateStartup,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<(Startup, StartupStatusHistory), StoreError> {
        Ok(StartupRepo::create(&self.pool, input, changed_by, at).await?)
    }

    async fn transition_status(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<StatusTransition>, StoreError> {
        Ok(
            StartupStatusHistoryRepo::transition(&self.pool, startup_id, new_status_id, changed_by, at)
                .await?,
        )
    }
}
