//! Handlers for tasks, created under a startup and read by id.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use dealflow_automation::ExecutionSummary;
use dealflow_core::attributes::EntityType;
use dealflow_core::error::CoreError;
use dealflow_core::priority::Priority;
use dealflow_core::types::DbId;
use dealflow_db::models::task::{CreateTask, Task, TASK_STATUS_TODO};
use dealflow_db::models::workflow_execution_log::{ExecutionLogFilter, WorkflowExecutionLog};
use dealflow_db::repositories::{StartupRepo, TaskRepo, WorkflowExecutionLogRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const TASK_STATUSES: &[&str] = &[TASK_STATUS_TODO, "in_progress", "done"];

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<DbId>,
    pub created_by: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTask {
    #[serde(flatten)]
    pub task: Task,
    pub workflow_runs: Vec<ExecutionSummary>,
}

/// POST /api/v1/startups/{id}/tasks
///
/// Inserts the task, then runs task-creation workflows against it.
pub async fn create(
    State(state): State<AppState>,
    Path(startup_id): Path<DbId>,
    Json(input): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<CreatedTask>)> {
    if input.title.trim().is_empty() {
        return Err(CoreError::Validation("Task title must not be empty".to_string()).into());
    }
    if let Some(ref status) = input.status {
        if !TASK_STATUSES.contains(&status.as_str()) {
            return Err(CoreError::Validation(format!(
                "Invalid task status: '{status}'. Must be one of: {}",
                TASK_STATUSES.join(", ")
            ))
            .into());
        }
    }
    if StartupRepo::find_by_id(&state.pool, startup_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Startup",
            id: startup_id,
        }));
    }

    let task = TaskRepo::create(
        &state.pool,
        &CreateTask {
            startup_id,
            title: input.title,
            description: input.description,
            status: input.status,
            priority: Some(
                Priority::normalize(input.priority.as_deref().unwrap_or_default()).to_string(),
            ),
            due_date: input.due_date,
            assignee_id: input.assignee_id,
            created_by: input.created_by,
        },
    )
    .await?;
    tracing::info!(task_id = task.id, startup_id, "Task created");

    let workflow_runs = state.engine.on_task_created(task.id).await;
    Ok((StatusCode::CREATED, Json(CreatedTask { task, workflow_runs })))
}

/// GET /api/v1/startups/{id}/tasks
pub async fn list_by_startup(
    State(state): State<AppState>,
    Path(startup_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = TaskRepo::list_for_startup(&state.pool, startup_id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Json<Task>> {
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    Ok(Json(task))
}

/// GET /api/v1/tasks/{id}/executions
pub async fn executions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<WorkflowExecutionLog>>>> {
    let filter = ExecutionLogFilter {
        limit: params.limit,
        offset: params.offset,
    };
    let logs =
        WorkflowExecutionLogRepo::list_for_entity(&state.pool, EntityType::Task.as_str(), id, &filter)
            .await?;
    Ok(Json(DataResponse { data: logs }))
}
