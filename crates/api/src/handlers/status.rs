//! Handlers for the `/statuses` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dealflow_core::error::CoreError;
use dealflow_db::models::status::{CreateStatus, Status};
use dealflow_db::repositories::StatusRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/statuses
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateStatus>,
) -> AppResult<(StatusCode, Json<Status>)> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Status name must not be empty".to_string()).into());
    }
    let status = StatusRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// GET /api/v1/statuses
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Status>>>> {
    let statuses = StatusRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: statuses }))
}
