pub mod health;
pub mod startup;
pub mod status;
pub mod task;
pub mod workflow;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /statuses                               list, create
///
/// /workflows                              list, create
/// /workflows/{id}                         get, update, delete
/// /workflows/{id}/toggle                  flip is_active (POST)
/// /workflows/{id}/logs                    execution logs
///
/// /startups                               list, create
/// /startups/{id}                          get, delete
/// /startups/{id}/status                   change status (PUT)
/// /startups/{id}/attributes               change one attribute (PATCH)
/// /startups/{id}/status-history           status intervals
/// /startups/{id}/history                  general audit trail
/// /startups/{id}/executions               workflow runs on this startup
/// /startups/{id}/tasks                    list, create
///
/// /tasks/{id}                             get
/// /tasks/{id}/executions                  workflow runs on this task
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/statuses", status::router())
        .nest("/workflows", workflow::router())
        .nest("/startups", startup::router())
        .nest("/tasks", task::router())
}
