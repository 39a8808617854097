//! General audit trail rows (`startup_history`).

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One field-level mutation of a startup. Append-only.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StartupHistory {
    pub id: DbId,
    pub startup_id: DbId,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: Option<DbId>,
    pub changed_at: Timestamp,
}

/// Input for appending an audit record. Values are already rendered.
#[derive(Debug, Clone)]
pub struct CreateStartupHistory {
    pub startup_id: DbId,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: Option<DbId>,
    pub changed_at: Timestamp,
}
