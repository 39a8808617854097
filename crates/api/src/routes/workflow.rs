//! Route definitions for the `/workflows` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workflow;
use crate::state::AppState;

/// Routes mounted at `/workflows`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// POST   /{id}/toggle   -> toggle
/// GET    /{id}/logs     -> list_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(workflow::list).post(workflow::create))
        .route(
            "/{id}",
            get(workflow::get_by_id)
                .put(workflow::update)
                .delete(workflow::delete),
        )
        .route("/{id}/toggle", post(workflow::toggle))
        .route("/{id}/logs", get(workflow::list_logs))
}
