//! Attribute-change action.
//!
//! Values are coerced before anything is written, so a rejected value
//! leaves neither an update nor an audit record. The audit record stores
//! the coerced value.

use dealflow_core::actions::{ActionType, AttributeChangeAction};
use dealflow_core::attributes::{coerce_attribute, StartupAttribute};
use dealflow_core::types::{DbId, Timestamp};
use dealflow_db::models::startup::AttributeUpdate;
use serde_json::{json, Value};

use super::{require_startup, ActionContext, ActionFailure, ActionOutput};
use crate::store::AutomationStore;
use crate::target::TargetEntity;

/// Coerce `raw` and write it with its audit record.
pub async fn apply_attribute_change(
    store: &dyn AutomationStore,
    startup_id: DbId,
    attribute: StartupAttribute,
    raw: &Value,
    changed_by: Option<DbId>,
    at: Timestamp,
) -> Result<AttributeUpdate, ActionFailure> {
    let value = coerce_attribute(attribute, raw)
        .map_err(|e| ActionFailure::InvalidValue(e.to_string()))?;
    store
        .update_startup_attribute(startup_id, attribute, &value, changed_by, at)
        .await?
        .ok_or(ActionFailure::NotFound {
            entity: "startup",
            id: startup_id,
        })
}

pub async fn change_attributes(
    action: &AttributeChangeAction,
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutput, ActionFailure> {
    let startup_id = require_startup(target, ActionType::AttributeChange)?;

    let mut changes = Vec::with_capacity(action.changes.len());
    for (attribute, raw) in &action.changes {
        let update =
            apply_attribute_change(ctx.store, startup_id, *attribute, raw, ctx.acting_user, ctx.now)
                .await?;
        let new_value = update
            .startup
            .field_map()
            .remove(attribute.column())
            .unwrap_or(Value::Null);
        changes.push(json!({
            "attribute": attribute.column(),
            "old_value": update.previous,
            "new_value": new_value,
        }));
    }

    let names: Vec<_> = action.changes.iter().map(|(a, _)| a.column()).collect();
    Ok(ActionOutput {
        message: format!("Updated {}", names.join(", ")),
        data: Some(json!({ "changes": changes })),
    })
}
