use std::sync::Arc;

use dealflow_automation::{StatusHistoryTracker, WorkflowEngine};

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dealflow_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Workflow engine, run after each successful mutation.
    pub engine: Arc<WorkflowEngine>,
    /// Owner of the status occupancy intervals.
    pub tracker: Arc<StatusHistoryTracker>,
}
