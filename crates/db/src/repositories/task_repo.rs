//! Repository for the `tasks` table.

use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, TASK_STATUS_TODO};

/// Column list for tasks queries.
const COLUMNS: &str = "id, startup_id, title, description, status, priority, due_date, \
    assignee_id, created_by, created_at, updated_at";

/// Provides create and read operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks
                (startup_id, title, description, status, priority, due_date, assignee_id, created_by)
             VALUES ($1, $2, $3, COALESCE($4, '{TASK_STATUS_TODO}'), COALESCE($5, 'medium'), $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.startup_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.due_date)
            .bind(input.assignee_id)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a task by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks attached to a startup, newest first.
    pub async fn list_for_startup(
        pool: &PgPool,
        startup_id: DbId,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE startup_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(startup_id)
            .fetch_all(pool)
            .await
    }
}
