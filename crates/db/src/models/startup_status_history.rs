//! Status occupancy intervals (`startup_status_history`).

use dealflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::startup::Startup;
use super::startup_history::StartupHistory;

/// One interval during which a startup occupied a status.
///
/// `end_date` and `duration_minutes` are `None` while the interval is open.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StartupStatusHistory {
    pub id: DbId,
    pub startup_id: DbId,
    pub status_id: DbId,
    pub status_name: String,
    pub start_date: Timestamp,
    pub end_date: Option<Timestamp>,
    pub duration_minutes: Option<i64>,
    pub changed_by: Option<DbId>,
}

impl StartupStatusHistory {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Result of moving a startup to a new status.
///
/// When the startup already had the requested status, `changed` is `false`
/// and nothing was written.
#[derive(Debug, Clone, Serialize)]
pub struct StatusTransition {
    pub startup: Startup,
    pub previous_status_id: DbId,
    pub changed: bool,
    pub closed: Vec<StartupStatusHistory>,
    pub opened: Option<StartupStatusHistory>,
    pub audit: Option<StartupHistory>,
}
