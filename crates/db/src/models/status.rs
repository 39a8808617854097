//! Pipeline status lookup rows.

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `statuses` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Status {
    pub id: DbId,
    pub name: String,
    pub color: String,
    pub position: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStatus {
    pub name: String,
    pub color: Option<String>,
    pub position: Option<i32>,
}
