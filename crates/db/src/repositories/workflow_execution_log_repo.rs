//! Repository for the `workflow_execution_logs` table. Insert and read only.

use dealflow_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::workflow_execution_log::{
    CreateWorkflowExecutionLog, ExecutionLogFilter, WorkflowExecutionLog,
};

/// Column list for workflow_execution_logs queries.
const COLUMNS: &str =
    "id, workflow_id, entity_type, entity_id, status, results, error_message, executed_at";

pub struct WorkflowExecutionLogRepo;

impl WorkflowExecutionLogRepo {
    /// Record one workflow run.
    pub async fn create(
        pool: &PgPool,
        input: &CreateWorkflowExecutionLog,
    ) -> Result<WorkflowExecutionLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflow_execution_logs
                (workflow_id, entity_type, entity_id, status, results, error_message)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkflowExecutionLog>(&query)
            .bind(input.workflow_id)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(&input.status)
            .bind(&input.results)
            .bind(&input.error_message)
            .fetch_one(pool)
            .await
    }

    /// Runs of one workflow, newest first.
    pub async fn list_for_workflow(
        pool: &PgPool,
        workflow_id: DbId,
        filter: &ExecutionLogFilter,
    ) -> Result<Vec<WorkflowExecutionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_execution_logs \
             WHERE workflow_id = $1 \
             ORDER BY executed_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WorkflowExecutionLog>(&query)
            .bind(workflow_id)
            .bind(clamp_limit(filter.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(filter.offset))
            .fetch_all(pool)
            .await
    }

    /// Runs that targeted one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        filter: &ExecutionLogFilter,
    ) -> Result<Vec<WorkflowExecutionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_execution_logs \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY executed_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, WorkflowExecutionLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(clamp_limit(filter.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(filter.offset))
            .fetch_all(pool)
            .await
    }
}
