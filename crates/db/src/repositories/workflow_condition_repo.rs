//! Repository for the `workflow_conditions` table.

use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::workflow_condition::{CreateWorkflowCondition, WorkflowCondition};

/// Column list for workflow_conditions queries.
const COLUMNS: &str = "id, workflow_id, field_name, operator, value, created_at";

/// Conditions are owned by their workflow and only replaced as a set.
pub struct WorkflowConditionRepo;

impl WorkflowConditionRepo {
    /// All conditions of a workflow in insertion order.
    pub async fn list_for_workflow(
        pool: &PgPool,
        workflow_id: DbId,
    ) -> Result<Vec<WorkflowCondition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_conditions WHERE workflow_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, WorkflowCondition>(&query)
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a workflow's conditions within an existing transaction.
    pub async fn replace(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        workflow_id: DbId,
        conditions: &[CreateWorkflowCondition],
    ) -> Result<Vec<WorkflowCondition>, sqlx::Error> {
        sqlx::query("DELETE FROM workflow_conditions WHERE workflow_id = $1")
            .bind(workflow_id)
            .execute(&mut **tx)
            .await?;

        let query = format!(
            "INSERT INTO workflow_conditions (workflow_id, field_name, operator, value)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let mut rows = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let row = sqlx::query_as::<_, WorkflowCondition>(&query)
                .bind(workflow_id)
                .bind(&condition.field_name)
                .bind(&condition.operator)
                .bind(&condition.value)
                .fetch_one(&mut **tx)
                .await?;
            rows.push(row);
        }
        Ok(rows)
    }
}
