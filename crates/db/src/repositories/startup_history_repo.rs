//! Repository for the `startup_history` audit trail.

use dealflow_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use dealflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::startup_history::{CreateStartupHistory, StartupHistory};

/// Column list for startup_history queries.
pub(crate) const COLUMNS: &str =
    "id, startup_id, field_name, old_value, new_value, changed_by, changed_at";

/// Append-only access to the general audit trail.
pub struct StartupHistoryRepo;

impl StartupHistoryRepo {
    /// Append an audit record inside the caller's transaction.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateStartupHistory,
    ) -> Result<StartupHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO startup_history
                (startup_id, field_name, old_value, new_value, changed_by, changed_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StartupHistory>(&query)
            .bind(input.startup_id)
            .bind(&input.field_name)
            .bind(&input.old_value)
            .bind(&input.new_value)
            .bind(input.changed_by)
            .bind(input.changed_at)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a startup's audit records, oldest first.
    pub async fn list_for_startup(
        pool: &PgPool,
        startup_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<StartupHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM startup_history \
             WHERE startup_id = $1 \
             ORDER BY changed_at ASC, id ASC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, StartupHistory>(&query)
            .bind(startup_id)
            .bind(clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }
}
