//! Route definitions for the `/startups` resource and its nested task,
//! history and execution-log collections.

use axum::routing::{get, patch, put};
use axum::Router;

use crate::handlers::{startup, task};
use crate::state::AppState;

/// Routes mounted at `/startups`.
///
/// ```text
/// GET    /                       -> list
/// POST   /                       -> create
/// GET    /{id}                   -> get_by_id
/// DELETE /{id}                   -> delete
/// PUT    /{id}/status            -> change_status
/// PATCH  /{id}/attributes        -> change_attribute
/// GET    /{id}/status-history    -> status_history
/// GET    /{id}/history           -> audit_history
/// GET    /{id}/executions        -> executions
/// GET    /{id}/tasks             -> task::list_by_startup
/// POST   /{id}/tasks             -> task::create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(startup::list).post(startup::create))
        .route("/{id}", get(startup::get_by_id).delete(startup::delete))
        .route("/{id}/status", put(startup::change_status))
        .route("/{id}/attributes", patch(startup::change_attribute))
        .route("/{id}/status-history", get(startup::status_history))
        .route("/{id}/history", get(startup::audit_history))
        .route("/{id}/executions", get(startup::executions))
        .route("/{id}/tasks", get(task::list_by_startup).post(task::create))
}
