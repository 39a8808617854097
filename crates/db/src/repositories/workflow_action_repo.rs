//! Repository for the `workflow_actions` table.

use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::workflow_action::{CreateWorkflowAction, WorkflowAction};

/// Column list for workflow_actions queries.
const COLUMNS: &str =
    "id, workflow_id, name, description, action_type, action_details, execution_order, created_at";

/// Actions are owned by their workflow and only replaced as a set.
pub struct WorkflowActionRepo;

impl WorkflowActionRepo {
    /// A workflow's actions in execution order; ties fall back to insertion order.
    pub async fn list_for_workflow(
        pool: &PgPool,
        workflow_id: DbId,
    ) -> Result<Vec<WorkflowAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_actions \
             WHERE workflow_id = $1 \
             ORDER BY execution_order ASC, id ASC"
        );
        sqlx::query_as::<_, WorkflowAction>(&query)
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a workflow's actions within an existing transaction.
    ///
    /// Actions without an explicit `execution_order` take their list index.
    pub async fn replace(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        workflow_id: DbId,
        actions: &[CreateWorkflowAction],
    ) -> Result<Vec<WorkflowAction>, sqlx::Error> {
        sqlx::query("DELETE FROM workflow_actions WHERE workflow_id = $1")
            .bind(workflow_id)
            .execute(&mut **tx)
            .await?;

        let query = format!(
            "INSERT INTO workflow_actions
                (workflow_id, name, description, action_type, action_details, execution_order)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let mut rows = Vec::with_capacity(actions.len());
        for (index, action) in actions.iter().enumerate() {
            let order = action.execution_order.unwrap_or(index as i32);
            let row = sqlx::query_as::<_, WorkflowAction>(&query)
                .bind(workflow_id)
                .bind(&action.name)
                .bind(&action.description)
                .bind(&action.action_type)
                .bind(&action.action_details)
                .bind(order)
                .fetch_one(&mut **tx)
                .await?;
            rows.push(row);
        }
        rows.sort_by_key(|a| (a.execution_order, a.id));
        Ok(rows)
    }
}
