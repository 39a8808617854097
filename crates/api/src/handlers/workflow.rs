//! Handlers for the `/workflows` resource.
//!
//! Definitions are validated in full before anything is stored: the trigger
//! details, every condition and every action must parse for the trigger's
//! target entity.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dealflow_core::actions::{ActionDetails, ActionType};
use dealflow_core::conditions::ConditionOperator;
use dealflow_core::error::CoreError;
use dealflow_core::types::DbId;
use dealflow_core::workflow::{
    validate_condition_field, validate_workflow_name, TriggerDetails, TriggerType,
    MAX_ACTIONS_PER_WORKFLOW, MAX_CONDITIONS_PER_WORKFLOW,
};
use dealflow_db::models::workflow::{
    CreateWorkflow, UpdateWorkflow, Workflow, WorkflowDetail, WorkflowFilter,
};
use dealflow_db::models::workflow_action::CreateWorkflowAction;
use dealflow_db::models::workflow_condition::CreateWorkflowCondition;
use dealflow_db::models::workflow_execution_log::{ExecutionLogFilter, WorkflowExecutionLog};
use dealflow_db::repositories::{StatusRepo, WorkflowExecutionLogRepo, WorkflowRepo};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Workflow",
        id,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The definition a create or update would leave in storage.
struct Definition<'a> {
    name: &'a str,
    trigger_type: &'a str,
    trigger_details: &'a Value,
    conditions: &'a [CreateWorkflowCondition],
    actions: &'a [CreateWorkflowAction],
}

async fn validate_definition(pool: &PgPool, def: &Definition<'_>) -> AppResult<()> {
    validate_workflow_name(def.name)?;

    let trigger_type = TriggerType::from_str(def.trigger_type)?;
    let details = TriggerDetails::parse(trigger_type, def.trigger_details)?;
    if let TriggerDetails::StatusChange { status_ids } = &details {
        for id in status_ids {
            if StatusRepo::find_by_id(pool, *id).await?.is_none() {
                return Err(
                    CoreError::Validation(format!("Status {id} does not exist")).into(),
                );
            }
        }
    }

    if def.conditions.len() > MAX_CONDITIONS_PER_WORKFLOW {
        return Err(CoreError::Validation(format!(
            "A workflow may have at most {MAX_CONDITIONS_PER_WORKFLOW} conditions"
        ))
        .into());
    }
    for condition in def.conditions {
        ConditionOperator::from_str(&condition.operator)?;
        validate_condition_field(trigger_type, &condition.field_name)?;
    }

    if def.actions.len() > MAX_ACTIONS_PER_WORKFLOW {
        return Err(CoreError::Validation(format!(
            "A workflow may have at most {MAX_ACTIONS_PER_WORKFLOW} actions"
        ))
        .into());
    }
    let target = trigger_type.target_entity();
    for action in def.actions {
        if action.name.trim().is_empty() {
            return Err(
                CoreError::Validation("Action name must not be empty".to_string()).into(),
            );
        }
        let action_type = ActionType::from_str(&action.action_type)?;
        ActionDetails::parse(action_type, &action.action_details)
            .and_then(|parsed| parsed.validate_for(target))
            .map_err(|e| match e {
                CoreError::Validation(msg) => {
                    CoreError::Validation(format!("Action '{}': {msg}", action.name))
                }
                other => other,
            })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/workflows
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateWorkflow>,
) -> AppResult<(StatusCode, Json<WorkflowDetail>)> {
    validate_definition(
        &state.pool,
        &Definition {
            name: &input.name,
            trigger_type: &input.trigger_type,
            trigger_details: &input.trigger_details,
            conditions: &input.conditions,
            actions: &input.actions,
        },
    )
    .await?;

    let detail = WorkflowRepo::create(&state.pool, &input).await?;
    tracing::info!(
        workflow_id = detail.workflow.id,
        trigger_type = %detail.workflow.trigger_type,
        conditions = detail.conditions.len(),
        actions = detail.actions.len(),
        "Workflow created",
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/workflows
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<WorkflowFilter>,
) -> AppResult<Json<DataResponse<Vec<Workflow>>>> {
    let workflows = WorkflowRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: workflows }))
}

/// GET /api/v1/workflows/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<WorkflowDetail>> {
    let detail = WorkflowRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(detail))
}

/// PUT /api/v1/workflows/{id}
///
/// Omitted fields keep their stored values; provided condition and action
/// lists replace the stored lists. The merged definition is validated as a
/// whole, so changing the trigger type re-checks the existing conditions.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorkflow>,
) -> AppResult<Json<WorkflowDetail>> {
    let existing = WorkflowRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let conditions: Vec<CreateWorkflowCondition> = match &input.conditions {
        Some(conditions) => conditions.clone(),
        None => existing
            .conditions
            .iter()
            .map(|c| CreateWorkflowCondition {
                field_name: c.field_name.clone(),
                operator: c.operator.clone(),
                value: c.value.clone(),
            })
            .collect(),
    };
    let actions: Vec<CreateWorkflowAction> = match &input.actions {
        Some(actions) => actions.clone(),
        None => existing
            .actions
            .iter()
            .map(|a| CreateWorkflowAction {
                name: a.name.clone(),
                description: a.description.clone(),
                action_type: a.action_type.clone(),
                action_details: a.action_details.clone(),
                execution_order: Some(a.execution_order),
            })
            .collect(),
    };

    validate_definition(
        &state.pool,
        &Definition {
            name: input.name.as_deref().unwrap_or(&existing.workflow.name),
            trigger_type: input
                .trigger_type
                .as_deref()
                .unwrap_or(&existing.workflow.trigger_type),
            trigger_details: input
                .trigger_details
                .as_ref()
                .unwrap_or(&existing.workflow.trigger_details),
            conditions: &conditions,
            actions: &actions,
        },
    )
    .await?;

    let detail = WorkflowRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(workflow_id = id, "Workflow updated");
    Ok(Json(detail))
}

/// DELETE /api/v1/workflows/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if WorkflowRepo::delete(&state.pool, id).await? {
        tracing::info!(workflow_id = id, "Workflow deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/workflows/{id}/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Workflow>> {
    let workflow = WorkflowRepo::toggle_active(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(workflow_id = id, is_active = workflow.is_active, "Workflow toggled");
    Ok(Json(workflow))
}

/// GET /api/v1/workflows/{id}/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<WorkflowExecutionLog>>>> {
    if WorkflowRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }
    let filter = ExecutionLogFilter {
        limit: params.limit,
        offset: params.offset,
    };
    let logs = WorkflowExecutionLogRepo::list_for_workflow(&state.pool, id, &filter).await?;
    Ok(Json(DataResponse { data: logs }))
}
