//! In-memory store and recording mailer for engine tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dealflow_automation::{AutomationStore, EngineConfig, StoreError, WorkflowEngine};
use dealflow_core::attributes::StartupAttribute;
use dealflow_core::priority::Priority;
use dealflow_core::status_history::{duration_minutes, status_label, STATUS_FIELD};
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::{audit_text, NOT_DEFINED};
use dealflow_core::workflow::TriggerType;
use dealflow_db::models::startup::{AttributeUpdate, ColumnValue, CreateStartup, Startup};
use dealflow_db::models::startup_history::StartupHistory;
use dealflow_db::models::startup_status_history::{StartupStatusHistory, StatusTransition};
use dealflow_db::models::status::Status;
use dealflow_db::models::task::{CreateTask, Task, TASK_STATUS_TODO};
use dealflow_db::models::workflow::Workflow;
use dealflow_db::models::workflow_action::WorkflowAction;
use dealflow_db::models::workflow_condition::WorkflowCondition;
use dealflow_db::models::workflow_execution_log::{
    CreateWorkflowExecutionLog, WorkflowExecutionLog,
};
use dealflow_notify::{EmailError, MailTransport, OutgoingEmail};
use serde_json::Value;

pub const LEAD: DbId = 1;
pub const SCREENING: DbId = 2;
pub const DUE_DILIGENCE: DbId = 3;

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    next_id: DbId,
    statuses: BTreeMap<DbId, Status>,
    startups: BTreeMap<DbId, Startup>,
    tasks: BTreeMap<DbId, Task>,
    workflows: BTreeMap<DbId, Workflow>,
    conditions: Vec<WorkflowCondition>,
    actions: Vec<WorkflowAction>,
    logs: Vec<WorkflowExecutionLog>,
    status_history: Vec<StartupStatusHistory>,
    history: Vec<StartupHistory>,
    fail_list_actions: bool,
}

impl State {
    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Mirrors the Postgres store's semantics closely enough for engine tests.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// A store seeded with the Lead, Screening and Due Diligence statuses.
    pub fn new() -> Arc<Self> {
        let store = Self {
            state: Mutex::new(State::default()),
        };
        for name in ["Lead", "Screening", "Due Diligence"] {
            store.add_status(name);
        }
        Arc::new(store)
    }

    pub fn add_status(&self, name: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let position = state.statuses.len() as i32;
        state.statuses.insert(
            id,
            Status {
                id,
                name: name.to_string(),
                color: "#6B7280".to_string(),
                position,
                created_at: t0(),
                updated_at: t0(),
            },
        );
        id
    }

    /// Insert a startup directly, without opening a status interval.
    pub fn add_startup(&self, name: &str, fields: Value) -> Startup {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let mut map = serde_json::json!({
            "id": id,
            "name": name,
            "status_id": LEAD,
            "priority": "medium",
            "is_incorporated": false,
            "has_investment": false,
            "created_at": t0(),
            "updated_at": t0(),
        });
        if let (Some(base), Some(extra)) = (map.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let startup: Startup = serde_json::from_value(map).unwrap();
        state.startups.insert(id, startup.clone());
        startup
    }

    pub fn add_workflow(
        &self,
        name: &str,
        trigger_type: TriggerType,
        trigger_details: Value,
        conditions: &[(&str, &str, &str)],
        actions: &[(&str, Value)],
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        state.workflows.insert(
            id,
            Workflow {
                id,
                name: name.to_string(),
                description: None,
                is_active: true,
                trigger_type: trigger_type.as_str().to_string(),
                trigger_details,
                created_by: None,
                created_at: t0(),
                updated_at: t0(),
            },
        );
        for (field_name, operator, value) in conditions {
            let condition_id = state.id();
            state.conditions.push(WorkflowCondition {
                id: condition_id,
                workflow_id: id,
                field_name: field_name.to_string(),
                operator: operator.to_string(),
                value: value.to_string(),
                created_at: t0(),
            });
        }
        for (order, (action_type, details)) in actions.iter().enumerate() {
            let action_id = state.id();
            state.actions.push(WorkflowAction {
                id: action_id,
                workflow_id: id,
                name: format!("{action_type} #{}", order + 1),
                description: None,
                action_type: action_type.to_string(),
                action_details: details.clone(),
                execution_order: order as i32,
                created_at: t0(),
            });
        }
        id
    }

    pub fn set_workflow_active(&self, workflow_id: DbId, active: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(workflow) = state.workflows.get_mut(&workflow_id) {
            workflow.is_active = active;
        }
    }

    pub fn fail_list_actions(&self) {
        self.state.lock().unwrap().fail_list_actions = true;
    }

    pub fn startup(&self, id: DbId) -> Startup {
        self.state.lock().unwrap().startups[&id].clone()
    }

    pub fn logs(&self) -> Vec<WorkflowExecutionLog> {
        self.state.lock().unwrap().logs.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.values().cloned().collect()
    }

    pub fn history(&self, startup_id: DbId) -> Vec<StartupHistory> {
        let state = self.state.lock().unwrap();
        state
            .history
            .iter()
            .filter(|h| h.startup_id == startup_id)
            .cloned()
            .collect()
    }

    pub fn status_history(&self, startup_id: DbId) -> Vec<StartupStatusHistory> {
        let state = self.state.lock().unwrap();
        state
            .status_history
            .iter()
            .filter(|h| h.startup_id == startup_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AutomationStore for MemoryStore {
    async fn get_startup(&self, id: DbId) -> Result<Option<Startup>, StoreError> {
        Ok(self.state.lock().unwrap().startups.get(&id).cloned())
    }

    async fn get_task(&self, id: DbId) -> Result<Option<Task>, StoreError> {
        Ok(self.state.lock().unwrap().tasks.get(&id).cloned())
    }

    async fn resolve_status(&self, id: DbId) -> Result<Option<Status>, StoreError> {
        Ok(self.state.lock().unwrap().statuses.get(&id).cloned())
    }

    async fn update_startup_attribute(
        &self,
        startup_id: DbId,
        attribute: StartupAttribute,
        value: &Value,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<AttributeUpdate>, StoreError> {
        let column = ColumnValue::from_json(attribute.kind(), value).ok_or_else(|| {
            StoreError::InvalidValue {
                attribute,
                value: value.to_string(),
            }
        })?;

        let mut state = self.state.lock().unwrap();
        let Some(current) = state.startups.get(&startup_id) else {
            return Ok(None);
        };
        let mut fields = current.field_map();
        let previous = fields
            .insert(attribute.column().to_string(), column.to_json())
            .unwrap_or(Value::Null);
        fields.insert("updated_at".to_string(), serde_json::json!(at));
        let startup: Startup = serde_json::from_value(Value::Object(fields))
            .map_err(|e| StoreError::Other(e.to_string()))?;

        let history_id = state.id();
        let history = StartupHistory {
            id: history_id,
            startup_id,
            field_name: attribute.column().to_string(),
            old_value: audit_text(Some(&previous)),
            new_value: column.audit_text(),
            changed_by,
            changed_at: at,
        };
        state.history.push(history.clone());
        state.startups.insert(startup_id, startup.clone());

        Ok(Some(AttributeUpdate {
            startup,
            previous,
            history,
        }))
    }

    async fn insert_task(&self, input: &CreateTask) -> Result<Task, StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.startups.contains_key(&input.startup_id) {
            return Err(StoreError::Other(format!(
                "startup {} does not exist",
                input.startup_id
            )));
        }
        let id = state.id();
        let task = Task {
            id,
            startup_id: input.startup_id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input
                .status
                .clone()
                .unwrap_or_else(|| TASK_STATUS_TODO.to_string()),
            priority: Priority::normalize(input.priority.as_deref().unwrap_or("")).to_string(),
            due_date: input.due_date,
            assignee_id: input.assignee_id,
            created_by: input.created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn list_active_workflows(
        &self,
        trigger_type: TriggerType,
    ) -> Result<Vec<Workflow>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .workflows
            .values()
            .filter(|w| w.is_active && w.trigger_type == trigger_type.as_str())
            .cloned()
            .collect())
    }

    async fn list_conditions(&self, workflow_id: DbId) -> Result<Vec<WorkflowCondition>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conditions
            .iter()
            .filter(|c| c.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    async fn list_actions(&self, workflow_id: DbId) -> Result<Vec<WorkflowAction>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_list_actions {
            return Err(StoreError::Other("connection reset".to_string()));
        }
        let mut actions: Vec<_> = state
            .actions
            .iter()
            .filter(|a| a.workflow_id == workflow_id)
            .cloned()
            .collect();
        actions.sort_by_key(|a| (a.execution_order, a.id));
        Ok(actions)
    }

    async fn insert_execution_log(
        &self,
        input: &CreateWorkflowExecutionLog,
    ) -> Result<WorkflowExecutionLog, StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let log = WorkflowExecutionLog {
            id,
            workflow_id: input.workflow_id,
            entity_type: input.entity_type.clone(),
            entity_id: input.entity_id,
            status: input.status.clone(),
            results: input.results.clone(),
            error_message: input.error_message.clone(),
            executed_at: Utc::now(),
        };
        state.logs.push(log.clone());
        Ok(log)
    }

    async fn create_startup(
        &self,
        input: &CreateStartup,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<(Startup, StartupStatusHistory), StoreError> {
        let status_name = {
            let state = self.state.lock().unwrap();
            state
                .statuses
                .get(&input.status_id)
                .map(|s| s.name.clone())
                .ok_or_else(|| StoreError::Other("foreign key violation".to_string()))?
        };
        let startup = self.add_startup(
            &input.name,
            serde_json::json!({
                "status_id": input.status_id,
                "sector": input.sector,
                "contact_email": input.contact_email,
                "priority": Priority::normalize(input.priority.as_deref().unwrap_or("")).as_str(),
                "created_at": at,
                "updated_at": at,
            }),
        );

        let mut state = self.state.lock().unwrap();
        let id = state.id();
        let interval = StartupStatusHistory {
            id,
            startup_id: startup.id,
            status_id: input.status_id,
            status_name,
            start_date: at,
            end_date: None,
            duration_minutes: None,
            changed_by,
        };
        state.status_history.push(interval.clone());
        Ok((startup, interval))
    }

    async fn transition_status(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<StatusTransition>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(startup) = state.startups.get(&startup_id).cloned() else {
            return Ok(None);
        };
        let previous_status_id = startup.status_id;
        if previous_status_id == new_status_id {
            return Ok(Some(StatusTransition {
                startup,
                previous_status_id,
                changed: false,
                closed: Vec::new(),
                opened: None,
                audit: None,
            }));
        }
        let Some(new_status) = state.statuses.get(&new_status_id).cloned() else {
            return Ok(None);
        };

        let mut closed = Vec::new();
        for interval in state
            .status_history
            .iter_mut()
            .filter(|h| h.startup_id == startup_id && h.is_open())
        {
            interval.end_date = Some(at);
            interval.duration_minutes = Some(duration_minutes(interval.start_date, at));
            closed.push(interval.clone());
        }

        let opened_id = state.id();
        let opened = StartupStatusHistory {
            id: opened_id,
            startup_id,
            status_id: new_status_id,
            status_name: new_status.name.clone(),
            start_date: at,
            end_date: None,
            duration_minutes: None,
            changed_by,
        };
        state.status_history.push(opened.clone());

        let mut updated = startup;
        updated.status_id = new_status_id;
        updated.updated_at = at;
        state.startups.insert(startup_id, updated.clone());

        let old_value = state
            .statuses
            .get(&previous_status_id)
            .map(|s| status_label(&s.name, s.id))
            .unwrap_or_else(|| NOT_DEFINED.to_string());
        let audit_id = state.id();
        let audit = StartupHistory {
            id: audit_id,
            startup_id,
            field_name: STATUS_FIELD.to_string(),
            old_value,
            new_value: status_label(&new_status.name, new_status.id),
            changed_by,
            changed_at: at,
        };
        state.history.push(audit.clone());

        Ok(Some(StatusTransition {
            startup: updated,
            previous_status_id,
            changed: true,
            closed,
            opened: Some(opened),
            audit: Some(audit),
        }))
    }
}

// ---------------------------------------------------------------------------
// RecordingMailer
// ---------------------------------------------------------------------------

/// Records every message; optionally fails or stalls each send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(EmailError::Build("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub fn engine(store: &Arc<MemoryStore>, mailer: &Arc<RecordingMailer>) -> WorkflowEngine {
    engine_with(store, mailer, EngineConfig::default())
}

pub fn engine_with(
    store: &Arc<MemoryStore>,
    mailer: &Arc<RecordingMailer>,
    config: EngineConfig,
) -> WorkflowEngine {
    WorkflowEngine::new(store.clone(), mailer.clone(), config)
}
