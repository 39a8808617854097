//! Task models and DTOs.

use chrono::NaiveDate;
use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Default status for newly created tasks.
pub const TASK_STATUS_TODO: &str = "todo";

/// A task row from the `tasks` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub startup_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Column-name keyed snapshot of the row.
    pub fn field_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Input for creating a task. `status` defaults to `todo` and `priority`
/// is normalized by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub startup_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<DbId>,
    pub created_by: Option<DbId>,
}
