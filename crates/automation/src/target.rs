//! The entity a workflow run operates on.

use dealflow_core::attributes::EntityType;
use dealflow_core::types::DbId;
use dealflow_db::models::startup::Startup;
use dealflow_db::models::task::Task;
use serde_json::{Map, Value};

/// Snapshot of the triggering entity, taken once per event.
///
/// `startup_id` is the startup the entity belongs to: the startup itself,
/// or the task's parent startup.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEntity {
    pub entity_type: EntityType,
    pub id: DbId,
    pub startup_id: DbId,
    pub fields: Map<String, Value>,
}

impl TargetEntity {
    pub fn from_startup(startup: &Startup) -> Self {
        Self {
            entity_type: EntityType::Startup,
            id: startup.id,
            startup_id: startup.id,
            fields: startup.field_map(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            entity_type: EntityType::Task,
            id: task.id,
            startup_id: task.startup_id,
            fields: task.field_map(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
