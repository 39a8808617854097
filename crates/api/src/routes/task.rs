use axum::routing::get;
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}              -> get_by_id
/// GET    /{id}/executions   -> executions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(task::get_by_id))
        .route("/{id}/executions", get(task::executions))
}
