//! Task-creation action.

use dealflow_core::actions::TaskCreationAction;
use dealflow_core::placeholders::substitute_placeholders;
use dealflow_db::models::task::{CreateTask, TASK_STATUS_TODO};
use serde_json::json;

use super::{ActionContext, ActionFailure, ActionOutput};
use crate::target::TargetEntity;

/// Create a follow-up task on the target's startup. The new task does not
/// trigger task-creation workflows.
pub async fn create_task(
    action: &TaskCreationAction,
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutput, ActionFailure> {
    let title = substitute_placeholders(&action.title, &target.fields);
    if title.trim().is_empty() {
        return Err(ActionFailure::Misconfigured(
            "task title is empty after substitution".to_string(),
        ));
    }

    let due_date = match action.due {
        Some(due) => Some(due.resolve(ctx.now.date_naive()).ok_or_else(|| {
            ActionFailure::InvalidValue(format!("due date {due:?} is out of range"))
        })?),
        None => None,
    };

    let input = CreateTask {
        startup_id: target.startup_id,
        title,
        description: action
            .description
            .as_deref()
            .map(|d| substitute_placeholders(d, &target.fields)),
        status: Some(TASK_STATUS_TODO.to_string()),
        priority: Some(action.priority.as_str().to_string()),
        due_date,
        assignee_id: action.assignee_id,
        created_by: ctx.acting_user,
    };
    let task = ctx.store.insert_task(&input).await?;

    Ok(ActionOutput {
        message: format!("Task '{}' created", task.title),
        data: Some(json!({
            "task_id": task.id,
            "startup_id": task.startup_id,
            "title": task.title,
            "priority": task.priority,
            "due_date": task.due_date,
        })),
    })
}
