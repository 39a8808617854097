//! Repository for the `workflows` table.
//!
//! Create and update write the workflow row and its condition/action lists
//! in one transaction, so readers never observe a half-written definition.

use dealflow_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::workflow::{
    CreateWorkflow, UpdateWorkflow, Workflow, WorkflowDetail, WorkflowFilter,
};
use crate::repositories::{WorkflowActionRepo, WorkflowConditionRepo};

/// Column list for workflows queries.
const COLUMNS: &str = "id, name, description, is_active, trigger_type, trigger_details, \
    created_by, created_at, updated_at";

/// Provides CRUD operations for workflows.
pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Insert a workflow with its conditions and actions.
    pub async fn create(
        pool: &PgPool,
        input: &CreateWorkflow,
    ) -> Result<WorkflowDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO workflows
                (name, description, is_active, trigger_type, trigger_details, created_by)
             VALUES ($1, $2, COALESCE($3, true), $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let workflow = sqlx::query_as::<_, Workflow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .bind(&input.trigger_type)
            .bind(&input.trigger_details)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let conditions = WorkflowConditionRepo::replace(&mut tx, workflow.id, &input.conditions).await?;
        let actions = WorkflowActionRepo::replace(&mut tx, workflow.id, &input.actions).await?;

        tx.commit().await?;
        Ok(WorkflowDetail {
            workflow,
            conditions,
            actions,
        })
    }

    /// Find a workflow by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows WHERE id = $1");
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a workflow together with its conditions and actions.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkflowDetail>, sqlx::Error> {
        let Some(workflow) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let conditions = WorkflowConditionRepo::list_for_workflow(pool, id).await?;
        let actions = WorkflowActionRepo::list_for_workflow(pool, id).await?;
        Ok(Some(WorkflowDetail {
            workflow,
            conditions,
            actions,
        }))
    }

    /// List workflows with optional filtering by trigger type and active flag.
    pub async fn list(pool: &PgPool, filter: &WorkflowFilter) -> Result<Vec<Workflow>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 0;

        if filter.trigger_type.is_some() {
            param_idx += 1;
            conditions.push(format!("trigger_type = ${param_idx}"));
        }
        if filter.is_active.is_some() {
            param_idx += 1;
            conditions.push(format!("is_active = ${param_idx}"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit_val = clamp_limit(filter.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        let offset_val = clamp_offset(filter.offset);
        param_idx += 1;
        let limit_idx = param_idx;
        param_idx += 1;
        let offset_idx = param_idx;

        let query = format!(
            "SELECT {COLUMNS} FROM workflows {where_clause} \
             ORDER BY id ASC \
             LIMIT ${limit_idx} OFFSET ${offset_idx}"
        );

        let mut q = sqlx::query_as::<_, Workflow>(&query);
        if let Some(ref tt) = filter.trigger_type {
            q = q.bind(tt);
        }
        if let Some(active) = filter.is_active {
            q = q.bind(active);
        }
        q = q.bind(limit_val).bind(offset_val);
        q.fetch_all(pool).await
    }

    /// Active workflows for a trigger type, in storage order.
    pub async fn list_active_by_trigger(
        pool: &PgPool,
        trigger_type: &str,
    ) -> Result<Vec<Workflow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflows \
             WHERE is_active = true AND trigger_type = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(trigger_type)
            .fetch_all(pool)
            .await
    }

    /// Update a workflow. Provided condition/action lists replace the stored
    /// ones. Returns `None` if not found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorkflow,
    ) -> Result<Option<WorkflowDetail>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE workflows SET
                name            = COALESCE($2, name),
                description     = COALESCE($3, description),
                is_active       = COALESCE($4, is_active),
                trigger_type    = COALESCE($5, trigger_type),
                trigger_details = COALESCE($6, trigger_details)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_active)
            .bind(&input.trigger_type)
            .bind(&input.trigger_details)
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_none() {
            return Ok(None);
        }
        if let Some(ref conditions) = input.conditions {
            WorkflowConditionRepo::replace(&mut tx, id, conditions).await?;
        }
        if let Some(ref actions) = input.actions {
            WorkflowActionRepo::replace(&mut tx, id, actions).await?;
        }

        tx.commit().await?;
        Self::find_detail(pool, id).await
    }

    /// Flip a workflow's active flag. Returns the updated row, or `None` if not found.
    pub async fn toggle_active(pool: &PgPool, id: DbId) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET is_active = NOT is_active WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a workflow. Conditions, actions and logs cascade.
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
