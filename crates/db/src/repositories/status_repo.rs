//! Repository for the `statuses` table.

use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::status::{CreateStatus, Status};

/// Column list for statuses queries.
const COLUMNS: &str = "id, name, color, position, created_at, updated_at";

/// Provides lookups for pipeline statuses.
pub struct StatusRepo;

impl StatusRepo {
    /// Insert a new status, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateStatus) -> Result<Status, sqlx::Error> {
        let query = format!(
            "INSERT INTO statuses (name, color, position)
             VALUES ($1, COALESCE($2, '#6b7280'), COALESCE($3, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Status>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .bind(input.position)
            .fetch_one(pool)
            .await
    }

    /// Find a status by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Status>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM statuses WHERE id = $1");
        sqlx::query_as::<_, Status>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all statuses in pipeline order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Status>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM statuses ORDER BY position ASC, id ASC");
        sqlx::query_as::<_, Status>(&query).fetch_all(pool).await
    }
}
