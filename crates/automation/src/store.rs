//! Storage seam for the engine.
//!
//! The engine and the status-history tracker operate exclusively through
//! [`AutomationStore`]; [`crate::PgAutomationStore`] is the production
//! backend and tests substitute an in-memory one.

use async_trait::async_trait;
use dealflow_core::attributes::StartupAttribute;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::workflow::TriggerType;
use dealflow_db::models::startup::{AttributeUpdate, CreateStartup, Startup};
use dealflow_db::models::startup_status_history::{StartupStatusHistory, StatusTransition};
use dealflow_db::models::status::Status;
use dealflow_db::models::task::{CreateTask, Task};
use dealflow_db::models::workflow::Workflow;
use dealflow_db::models::workflow_action::WorkflowAction;
use dealflow_db::models::workflow_condition::WorkflowCondition;
use dealflow_db::models::workflow_execution_log::{
    CreateWorkflowExecutionLog, WorkflowExecutionLog,
};
use serde_json::Value;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A coerced value that the target column cannot hold.
    #[error("Invalid value for {attribute}: {value}")]
    InvalidValue {
        attribute: StartupAttribute,
        value: String,
    },

    #[error("Storage error: {0}")]
    Other(String),
}

/// Persistence operations used by the engine and the tracker.
#[async_trait]
pub trait AutomationStore: Send + Sync {
    // -- Entities --

    async fn get_startup(&self, id: DbId) -> Result<Option<Startup>, StoreError>;
    async fn get_task(&self, id: DbId) -> Result<Option<Task>, StoreError>;
    async fn resolve_status(&self, id: DbId) -> Result<Option<Status>, StoreError>;

    /// Write one coerced attribute value and its audit record atomically.
    /// Returns `None` if the startup does not exist.
    async fn update_startup_attribute(
        &self,
        startup_id: DbId,
        attribute: StartupAttribute,
        value: &Value,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<AttributeUpdate>, StoreError>;

    async fn insert_task(&self, input: &CreateTask) -> Result<Task, StoreError>;

    // -- Workflow definitions --

    /// Active workflows for a trigger type, in storage order.
    async fn list_active_workflows(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<Workflow>, StoreError>;
    async fn list_conditions(&self, workflow_id: DbId) -> Result<Vec<WorkflowCondition>, StoreError>;
    /// Actions ordered by `execution_order`, ties by insertion order.
    async fn list_actions(&self, workflow_id: DbId) -> Result<Vec<WorkflowAction>, StoreError>;

    // -- Execution log --

    async fn insert_execution_log(
        &self,
        input: &CreateWorkflowExecutionLog,
    ) -> Result<WorkflowExecutionLog, StoreError>;

    // -- Status history --

    /// Insert a startup and open its first status interval atomically.
    async fn create_startup(
        &self,
        input: &CreateStartup,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<(Startup, StartupStatusHistory), StoreError>;

    /// Close the open interval(s), open one for `new_status_id`, update the
    /// startup and append the audit record, all-or-nothing. Returns `None`
    /// if the startup or status does not exist.
    async fn transition_status(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<StatusTransition>, StoreError>;
}
