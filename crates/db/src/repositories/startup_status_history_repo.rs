//! Repository for `startup_status_history` and the status transition.
//!
//! A startup has at most one open interval (`end_date IS NULL`). The
//! transition below keeps that true under concurrent writers by locking the
//! startup row before touching its intervals; the partial unique index
//! `uq_startup_status_history_open` backs it up in storage.

use dealflow_core::status_history::{duration_minutes, status_label, STATUS_FIELD};
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::NOT_DEFINED;
use sqlx::PgPool;

use crate::models::startup::Startup;
use crate::models::startup_history::CreateStartupHistory;
use crate::models::startup_status_history::{StartupStatusHistory, StatusTransition};
use crate::repositories::startup_repo::COLUMNS as STARTUP_COLUMNS;
use crate::repositories::{StartupHistoryRepo, StartupRepo};

/// Column list for startup_status_history queries.
const COLUMNS: &str = "id, startup_id, status_id, status_name, start_date, end_date, \
    duration_minutes, changed_by";

/// Status occupancy intervals and the transition that maintains them.
pub struct StartupStatusHistoryRepo;

impl StartupStatusHistoryRepo {
    /// Open a new interval inside the caller's transaction.
    pub async fn open_interval(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        startup_id: DbId,
        status_id: DbId,
        status_name: &str,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<StartupStatusHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO startup_status_history
                (startup_id, status_id, status_name, start_date, changed_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StartupStatusHistory>(&query)
            .bind(startup_id)
            .bind(status_id)
            .bind(status_name)
            .bind(at)
            .bind(changed_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Close every open interval of a startup at `at`, inside the caller's
    /// transaction. Returns the closed rows.
    pub async fn close_open_intervals(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        startup_id: DbId,
        at: Timestamp,
    ) -> Result<Vec<StartupStatusHistory>, sqlx::Error> {
        let select = format!(
            "SELECT {COLUMNS} FROM startup_status_history \
             WHERE startup_id = $1 AND end_date IS NULL \
             ORDER BY start_date ASC, id ASC \
             FOR UPDATE"
        );
        let open = sqlx::query_as::<_, StartupStatusHistory>(&select)
            .bind(startup_id)
            .fetch_all(&mut **tx)
            .await?;

        let update = format!(
            "UPDATE startup_status_history SET end_date = $2, duration_minutes = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let mut closed = Vec::with_capacity(open.len());
        for interval in open {
            let row = sqlx::query_as::<_, StartupStatusHistory>(&update)
                .bind(interval.id)
                .bind(at)
                .bind(duration_minutes(interval.start_date, at))
                .fetch_one(&mut **tx)
                .await?;
            closed.push(row);
        }
        Ok(closed)
    }

    /// Move a startup to `new_status_id` atomically.
    ///
    /// Locks the startup, closes its open interval(s), opens the new one,
    /// updates `startups.status_id` and appends the `status_id` audit record.
    /// Re-setting the current status writes nothing. Returns `None` if the
    /// startup or the target status does not exist.
    pub async fn transition(
        pool: &PgPool,
        startup_id: DbId,
        new_status_id: DbId,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<StatusTransition>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(startup) = StartupRepo::find_for_update(&mut tx, startup_id).await? else {
            return Ok(None);
        };
        let previous_status_id = startup.status_id;

        if previous_status_id == new_status_id {
            tx.commit().await?;
            return Ok(Some(StatusTransition {
                startup,
                previous_status_id,
                changed: false,
                closed: Vec::new(),
                opened: None,
                audit: None,
            }));
        }

        let Some(new_name) = Self::status_name(&mut tx, new_status_id).await? else {
            return Ok(None);
        };
        let old_label = match Self::status_name(&mut tx, previous_status_id).await? {
            Some(name) => status_label(&name, previous_status_id),
            None => NOT_DEFINED.to_string(),
        };

        let closed = Self::close_open_intervals(&mut tx, startup_id, at).await?;

        let opened =
            Self::open_interval(&mut tx, startup_id, new_status_id, &new_name, changed_by, at)
                .await?;

        let query = format!(
            "UPDATE startups SET status_id = $2 WHERE id = $1 RETURNING {STARTUP_COLUMNS}"
        );
        let startup = sqlx::query_as::<_, Startup>(&query)
            .bind(startup_id)
            .bind(new_status_id)
            .fetch_one(&mut *tx)
            .await?;

        let audit = StartupHistoryRepo::insert(
            &mut tx,
            &CreateStartupHistory {
                startup_id,
                field_name: STATUS_FIELD.to_string(),
                old_value: old_label,
                new_value: status_label(&new_name, new_status_id),
                changed_by,
                changed_at: at,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(StatusTransition {
            startup,
            previous_status_id,
            changed: true,
            closed,
            opened: Some(opened),
            audit: Some(audit),
        }))
    }

    /// A startup's intervals in chronological order.
    pub async fn list_for_startup(
        pool: &PgPool,
        startup_id: DbId,
    ) -> Result<Vec<StartupStatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM startup_status_history \
             WHERE startup_id = $1 \
             ORDER BY start_date ASC, id ASC"
        );
        sqlx::query_as::<_, StartupStatusHistory>(&query)
            .bind(startup_id)
            .fetch_all(pool)
            .await
    }

    /// The startup's open interval, if any.
    pub async fn find_open(
        pool: &PgPool,
        startup_id: DbId,
    ) -> Result<Option<StartupStatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM startup_status_history \
             WHERE startup_id = $1 AND end_date IS NULL"
        );
        sqlx::query_as::<_, StartupStatusHistory>(&query)
            .bind(startup_id)
            .fetch_optional(pool)
            .await
    }

    async fn status_name(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        status_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM statuses WHERE id = $1")
            .bind(status_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|(name,)| name))
    }
}
