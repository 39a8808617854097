//! Status-query action: resolves the startup's current status.

use dealflow_core::actions::ActionType;
use serde_json::json;

use super::{require_startup, ActionContext, ActionFailure, ActionOutput};
use crate::target::TargetEntity;

pub async fn query_status(
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutput, ActionFailure> {
    let startup_id = require_startup(target, ActionType::StatusQuery)?;

    let startup = ctx
        .store
        .get_startup(startup_id)
        .await?
        .ok_or(ActionFailure::NotFound {
            entity: "startup",
            id: startup_id,
        })?;
    let status = ctx
        .store
        .resolve_status(startup.status_id)
        .await?
        .ok_or(ActionFailure::NotFound {
            entity: "status",
            id: startup.status_id,
        })?;

    Ok(ActionOutput {
        message: format!("Current status: {}", status.name),
        data: Some(json!({
            "status_id": status.id,
            "status_name": status.name,
            "status_color": status.color,
        })),
    })
}
