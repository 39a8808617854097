//! Status History Tracker.
//!
//! Owns the status occupancy intervals: a startup gets an open interval
//! when it is created, and every transition closes the open interval and
//! opens the next one. Unlike workflow runs, these writes are authoritative:
//! a failure here fails the caller's operation.

use std::sync::Arc;

use chrono::Utc;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_db::models::startup::{CreateStartup, Startup};
use dealflow_db::models::startup_status_history::{StartupStatusHistory, StatusTransition};

use crate::store::{AutomationStore, StoreError};

/// Error type for status-history operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Startup {0} not found")]
    StartupNotFound(DbId),

    #[error("Status {0} not found")]
    StatusNotFound(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct StatusHistoryTracker {
    store: Arc<dyn AutomationStore>,
}

impl StatusHistoryTracker {
    pub fn new(store: Arc<dyn AutomationStore>) -> Self {
        Self { store }
    }

    /// Create a startup with an open interval for its initial status.
    pub async fn register_startup(
        &self,
        input: &CreateStartup,
        acting_user: Option<DbId>,
    ) -> Result<(Startup, StartupStatusHistory), TrackerError> {
        self.register_startup_at(input, acting_user, Utc::now()).await
    }

    pub async fn register_startup_at(
        &self,
        input: &CreateStartup,
        acting_user: Option<DbId>,
        at: Timestamp,
    ) -> Result<(Startup, StartupStatusHistory), TrackerError> {
        if self.store.resolve_status(input.status_id).await?.is_none() {
            return Err(TrackerError::StatusNotFound(input.status_id));
        }
        let (startup, interval) = self.store.create_startup(input, acting_user, at).await?;

        tracing::info!(
            startup_id = startup.id,
            status_id = startup.status_id,
            "Startup created, initial status interval opened",
        );
        Ok((startup, interval))
    }

    /// Move a startup to `new_status_id`.
    pub async fn transition(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        acting_user: Option<DbId>,
    ) -> Result<StatusTransition, TrackerError> {
        self.transition_at(startup_id, new_status_id, acting_user, Utc::now())
            .await
    }

    /// Move a startup to `new_status_id` as of `at`.
    ///
    /// Setting the status the startup already has is a no-op and comes back
    /// with `changed == false`.
    pub async fn transition_at(
        &self,
        startup_id: DbId,
        new_status_id: DbId,
        acting_user: Option<DbId>,
        at: Timestamp,
    ) -> Result<StatusTransition, TrackerError> {
        if self.store.resolve_status(new_status_id).await?.is_none() {
            return Err(TrackerError::StatusNotFound(new_status_id));
        }
        let transition = self
            .store
            .transition_status(startup_id, new_status_id, acting_user, at)
            .await?
            .ok_or(TrackerError::StartupNotFound(startup_id))?;

        if !transition.changed {
            tracing::debug!(startup_id, status_id = new_status_id, "Status unchanged");
            return Ok(transition);
        }

        if transition.closed.is_empty() {
            tracing::warn!(startup_id, "No open status interval found to close");
        }
        for interval in &transition.closed {
            tracing::debug!(
                startup_id,
                status_id = interval.status_id,
                duration_minutes = interval.duration_minutes,
                "Status interval closed",
            );
        }
        tracing::info!(
            startup_id,
            from_status_id = transition.previous_status_id,
            to_status_id = new_status_id,
            "Startup status changed",
        );
        Ok(transition)
    }
}
