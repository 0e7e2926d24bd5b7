/// Module association model and database operations
///
/// Associates volunteers with a module. Association grants WRITE in the
/// module (together with membership of the shelter), never MANAGE.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE module_volunteers (
///     module_id UUID NOT NULL REFERENCES shelter_modules(id) ON DELETE CASCADE,
///     volunteer_id UUID NOT NULL REFERENCES volunteers(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (module_id, volunteer_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A volunteer associated with a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModuleVolunteer {
    pub module_id: Uuid,
    pub volunteer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ModuleVolunteer {
    /// Returns true if the volunteer is associated with the module
    pub async fn exists(
        pool: &PgPool,
        module_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM module_volunteers
                WHERE module_id = $1 AND volunteer_id = $2
            )
            "#,
        )
        .bind(module_id)
        .bind(volunteer_id)
        .fetch_one(pool)
        .await
    }

    /// Lists the volunteer ids associated with a module
    pub async fn list_volunteer_ids(
        pool: &PgPool,
        module_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT volunteer_id FROM module_volunteers
            WHERE module_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(module_id)
        .fetch_all(pool)
        .await
    }

    /// Adds associations, skipping pairs that already exist
    ///
    /// Returns the number of rows actually inserted.
    pub async fn add_many(
        pool: &PgPool,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO module_volunteers (module_id, volunteer_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT (module_id, volunteer_id) DO NOTHING
            "#,
        )
        .bind(module_id)
        .bind(volunteer_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes one association; returns true if a row was deleted
    pub async fn remove(
        pool: &PgPool,
        module_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM module_volunteers WHERE module_id = $1 AND volunteer_id = $2",
        )
        .bind(module_id)
        .bind(volunteer_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically replaces the association set of a module
    ///
    /// Runs delete-all and insert in one transaction so readers never
    /// observe a partially replaced set.
    pub async fn replace(
        pool: &PgPool,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM module_volunteers WHERE module_id = $1")
            .bind(module_id)
            .execute(&mut *tx)
            .await?;

        if !volunteer_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO module_volunteers (module_id, volunteer_id)
                SELECT $1, UNNEST($2::uuid[])
                ON CONFLICT (module_id, volunteer_id) DO NOTHING
                "#,
            )
            .bind(module_id)
            .bind(volunteer_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
