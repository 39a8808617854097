//! Action executors.
//!
//! Each executor takes its parsed payload, the run's target entity and the
//! shared [`ActionContext`], and either returns an [`ActionOutput`] or an
//! [`ActionFailure`]. Failures are recorded per action by the runner and
//! never abort the run.

pub mod attribute;
pub mod email;
pub mod status_query;
pub mod task;

use std::time::Duration;

use dealflow_core::actions::{ActionDetails, ActionType};
use dealflow_core::attributes::EntityType;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_notify::{EmailError, MailTransport};
use serde_json::Value;

use crate::store::{AutomationStore, StoreError};
use crate::target::TargetEntity;

/// Collaborators available to every executor during one run.
pub struct ActionContext<'a> {
    pub store: &'a dyn AutomationStore,
    pub mailer: &'a dyn MailTransport,
    /// User whose mutation triggered the run, if known.
    pub acting_user: Option<DbId>,
    pub now: Timestamp,
}

/// Successful action outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutput {
    pub message: String,
    pub data: Option<Value>,
}

/// Why an action did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    #[error("Misconfigured action: {0}")]
    Misconfigured(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{action} actions are only supported for startups, not {entity_type}")]
    UnsupportedTarget {
        action: ActionType,
        entity_type: EntityType,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    #[error("Action timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

/// Dispatch a parsed action to its executor.
pub async fn execute(
    details: &ActionDetails,
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutput, ActionFailure> {
    match details {
        ActionDetails::Email(action) => email::send_email(action, target, ctx).await,
        ActionDetails::AttributeChange(action) => {
            attribute::change_attributes(action, target, ctx).await
        }
        ActionDetails::TaskCreation(action) => task::create_task(action, target, ctx).await,
        ActionDetails::StatusQuery => status_query::query_status(target, ctx).await,
    }
}

/// The startup id of `target`, or a failure if `action` cannot run on it.
fn require_startup(target: &TargetEntity, action: ActionType) -> Result<DbId, ActionFailure> {
    match target.entity_type {
        EntityType::Startup => Ok(target.id),
        entity_type => Err(ActionFailure::UnsupportedTarget {
            action,
            entity_type,
        }),
    }
}
