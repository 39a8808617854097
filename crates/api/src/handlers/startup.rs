//! Handlers for the `/startups` resource.
//!
//! Status and attribute changes are authoritative writes; the workflow runs
//! they raise afterwards are reported in the response but never fail it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dealflow_automation::ExecutionSummary;
use dealflow_core::attributes::{EntityType, StartupAttribute};
use dealflow_core::error::CoreError;
use dealflow_core::types::DbId;
use dealflow_db::models::startup::{AttributeUpdate, CreateStartup, Startup};
use dealflow_db::models::startup_history::StartupHistory;
use dealflow_db::models::startup_status_history::{StartupStatusHistory, StatusTransition};
use dealflow_db::models::workflow_execution_log::{ExecutionLogFilter, WorkflowExecutionLog};
use dealflow_db::repositories::{
    StartupHistoryRepo, StartupRepo, StartupStatusHistoryRepo, WorkflowExecutionLogRepo,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Startup",
        id,
    })
}

async fn ensure_exists(state: &AppState, id: DbId) -> AppResult<()> {
    match StartupRepo::find_by_id(&state.pool, id).await? {
        Some(_) => Ok(()),
        None => Err(not_found(id)),
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateStartupRequest {
    #[serde(flatten)]
    pub startup: CreateStartup,
    pub acting_user_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct CreatedStartup {
    #[serde(flatten)]
    pub startup: Startup,
    pub status_interval: StartupStatusHistory,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status_id: DbId,
    pub acting_user_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    #[serde(flatten)]
    pub transition: StatusTransition,
    pub workflow_runs: Vec<ExecutionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeAttributeRequest {
    pub attribute: String,
    #[serde(default)]
    pub value: Value,
    pub acting_user_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct AttributeChangeResponse {
    #[serde(flatten)]
    pub update: AttributeUpdate,
    pub workflow_runs: Vec<ExecutionSummary>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/startups
///
/// Creates the startup and opens its first status interval.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateStartupRequest>,
) -> AppResult<(StatusCode, Json<CreatedStartup>)> {
    if input.startup.name.trim().is_empty() {
        return Err(CoreError::Validation("Startup name must not be empty".to_string()).into());
    }
    let (startup, status_interval) = state
        .tracker
        .register_startup(&input.startup, input.acting_user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedStartup {
            startup,
            status_interval,
        }),
    ))
}

/// GET /api/v1/startups
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Startup>>>> {
    let startups = StartupRepo::list(&state.pool, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: startups }))
}

/// GET /api/v1/startups/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Startup>> {
    let startup = StartupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(startup))
}

/// DELETE /api/v1/startups/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if StartupRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// PUT /api/v1/startups/{id}/status
///
/// Moves the startup to a new status, then runs status-change workflows.
/// Setting the current status again changes nothing and runs nothing.
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeStatusRequest>,
) -> AppResult<Json<StatusChangeResponse>> {
    let transition = state
        .tracker
        .transition(id, input.status_id, input.acting_user_id)
        .await?;

    let workflow_runs = if transition.changed {
        state
            .engine
            .on_status_changed(id, input.status_id, input.acting_user_id)
            .await
    } else {
        Vec::new()
    };

    Ok(Json(StatusChangeResponse {
        transition,
        workflow_runs,
    }))
}

/// PATCH /api/v1/startups/{id}/attributes
///
/// Writes one attribute with its audit record, then runs attribute-change
/// workflows. Status cannot be changed here.
pub async fn change_attribute(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeAttributeRequest>,
) -> AppResult<Json<AttributeChangeResponse>> {
    if input.attribute == "status_id" {
        return Err(AppError::BadRequest(format!(
            "Use PUT /api/v1/startups/{id}/status to change the status"
        )));
    }
    let attribute = StartupAttribute::from_str(&input.attribute)?;

    let (update, workflow_runs) = state
        .engine
        .set_attribute(id, attribute, &input.value, input.acting_user_id)
        .await?;

    Ok(Json(AttributeChangeResponse {
        update,
        workflow_runs,
    }))
}

/// GET /api/v1/startups/{id}/status-history
pub async fn status_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StartupStatusHistory>>>> {
    ensure_exists(&state, id).await?;
    let intervals = StartupStatusHistoryRepo::list_for_startup(&state.pool, id).await?;
    Ok(Json(DataResponse { data: intervals }))
}

/// GET /api/v1/startups/{id}/history
pub async fn audit_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<StartupHistory>>>> {
    ensure_exists(&state, id).await?;
    let history =
        StartupHistoryRepo::list_for_startup(&state.pool, id, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/startups/{id}/executions
pub async fn executions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<WorkflowExecutionLog>>>> {
    ensure_exists(&state, id).await?;
    let filter = ExecutionLogFilter {
        limit: params.limit,
        offset: params.offset,
    };
    let logs = WorkflowExecutionLogRepo::list_for_entity(
        &state.pool,
        EntityType::Startup.as_str(),
        id,
        &filter,
    )
    .await?;
    Ok(Json(DataResponse { data: logs }))
}
