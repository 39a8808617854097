//! Repository for the `startups` table.

use dealflow_core::attributes::StartupAttribute;
use dealflow_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use dealflow_core::priority::Priority;
use dealflow_core::types::{DbId, Timestamp};
use dealflow_core::values::audit_text;
use serde_json::Value;
use sqlx::PgPool;

use crate::models::startup::{AttributeUpdate, ColumnValue, CreateStartup, Startup};
use crate::models::startup_history::CreateStartupHistory;
use crate::models::startup_status_history::StartupStatusHistory;
use crate::repositories::{StartupHistoryRepo, StartupStatusHistoryRepo};

/// Column list for startups queries.
pub(crate) const COLUMNS: &str = "id, name, description, sector, ceo_name, ceo_email, \
    contact_email, website, city, status_id, priority, is_incorporated, has_investment, \
    mrr, tam, sam, som, client_count, employee_count, created_at, updated_at";

/// Provides persistence for startups.
pub struct StartupRepo;

impl StartupRepo {
    /// Insert a startup and open its first status interval in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateStartup,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<(Startup, StartupStatusHistory), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let priority = input
            .priority
            .as_deref()
            .map(Priority::normalize)
            .unwrap_or_default();

        let query = format!(
            "INSERT INTO startups
                (name, description, sector, ceo_name, ceo_email, contact_email, website, city,
                 status_id, priority, is_incorporated, has_investment,
                 mrr, tam, sam, som, client_count, employee_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     COALESCE($11, false), COALESCE($12, false), $13, $14, $15, $16, $17, $18)
             RETURNING {COLUMNS}"
        );
        let startup = sqlx::query_as::<_, Startup>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.sector)
            .bind(&input.ceo_name)
            .bind(&input.ceo_email)
            .bind(&input.contact_email)
            .bind(&input.website)
            .bind(&input.city)
            .bind(input.status_id)
            .bind(priority.as_str())
            .bind(input.is_incorporated)
            .bind(input.has_investment)
            .bind(input.mrr)
            .bind(input.tam)
            .bind(input.sam)
            .bind(input.som)
            .bind(input.client_count)
            .bind(input.employee_count)
            .fetch_one(&mut *tx)
            .await?;

        let (status_name,): (String,) = sqlx::query_as("SELECT name FROM statuses WHERE id = $1")
            .bind(startup.status_id)
            .fetch_one(&mut *tx)
            .await?;

        let interval = StartupStatusHistoryRepo::open_interval(
            &mut tx,
            startup.id,
            startup.status_id,
            &status_name,
            changed_by,
            at,
        )
        .await?;

        tx.commit().await?;
        Ok((startup, interval))
    }

    /// Find a startup by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Startup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM startups WHERE id = $1");
        sqlx::query_as::<_, Startup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a startup row for the rest of the caller's transaction.
    pub async fn find_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<Startup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM startups WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Startup>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List startups, most recently created first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Startup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM startups ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Startup>(&query)
            .bind(clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }

    /// Write one attribute and its audit record in a single transaction.
    ///
    /// The row is locked first so the recorded old value is the one being
    /// replaced. Returns `None` if the startup does not exist.
    pub async fn update_attribute(
        pool: &PgPool,
        id: DbId,
        attribute: StartupAttribute,
        value: &ColumnValue,
        changed_by: Option<DbId>,
        at: Timestamp,
    ) -> Result<Option<AttributeUpdate>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::find_for_update(&mut tx, id).await? else {
            return Ok(None);
        };
        let previous = current
            .field_map()
            .remove(attribute.column())
            .unwrap_or(Value::Null);

        let history = StartupHistoryRepo::insert(
            &mut tx,
            &CreateStartupHistory {
                startup_id: id,
                field_name: attribute.column().to_string(),
                old_value: audit_text(Some(&previous)),
                new_value: value.audit_text(),
                changed_by,
                changed_at: at,
            },
        )
        .await?;

        let query = format!(
            "UPDATE startups SET {column} = $2 WHERE id = $1 RETURNING {COLUMNS}",
            column = attribute.column()
        );
        let update = sqlx::query_as::<_, Startup>(&query).bind(id);
        let update = match value {
            ColumnValue::Text(v) => update.bind(v.clone()),
            ColumnValue::Bool(v) => update.bind(*v),
            ColumnValue::Float(v) => update.bind(*v),
            ColumnValue::Int(v) => update.bind(*v),
        };
        let startup = update.fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(AttributeUpdate {
            startup,
            previous,
            history,
        }))
    }

    /// Delete a startup. History rows cascade. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM startups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
