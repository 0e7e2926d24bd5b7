/// Shelter-scoped domain records (animals, resources, sheltered people)
///
/// The three record families share one shape: an id, the owning shelter, a
/// name and free-form JSON details. They live in separate tables; the
/// [`RecordFamily`] selects which one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE animals (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     shelter_id UUID NOT NULL REFERENCES shelters(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     details JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// -- resources and sheltered_people have the same layout
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::shelter_module::ModuleKey;

/// Which table a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordFamily {
    Animals,
    Resources,
    ShelteredPeople,
}

impl RecordFamily {
    pub const ALL: [RecordFamily; 3] = [
        RecordFamily::Animals,
        RecordFamily::Resources,
        RecordFamily::ShelteredPeople,
    ];

    /// Database table name
    pub fn table(&self) -> &'static str {
        match self {
            RecordFamily::Animals => "animals",
            RecordFamily::Resources => "resources",
            RecordFamily::ShelteredPeople => "sheltered_people",
        }
    }

    /// URL path segment
    pub fn path_segment(&self) -> &'static str {
        match self {
            RecordFamily::Animals => "animals",
            RecordFamily::Resources => "resources",
            RecordFamily::ShelteredPeople => "sheltered-people",
        }
    }

    /// The module that governs access to this family
    pub fn module_key(&self) -> ModuleKey {
        match self {
            RecordFamily::Animals => ModuleKey::Animals,
            RecordFamily::Resources => ModuleKey::Resources,
            RecordFamily::ShelteredPeople => ModuleKey::People,
        }
    }
}

/// Anything whose owning shelter can be looked up by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Record(RecordFamily),
    Volunteer,
}

/// A record of one of the families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShelterRecord {
    pub id: Uuid,
    pub shelter_id: Uuid,
    pub name: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub shelter_id: Uuid,
    pub name: String,
    pub details: serde_json::Value,
}

impl ShelterRecord {
    /// Inserts a record into the family's table
    pub async fn create(
        pool: &PgPool,
        family: RecordFamily,
        data: NewRecord,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO {} (shelter_id, name, details)
            VALUES ($1, $2, $3)
            RETURNING id, shelter_id, name, details, created_at
            "#,
            family.table()
        );

        sqlx::query_as::<_, ShelterRecord>(&sql)
            .bind(data.shelter_id)
            .bind(data.name)
            .bind(data.details)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        family: RecordFamily,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT id, shelter_id, name, details, created_at FROM {} WHERE id = $1",
            family.table()
        );

        sqlx::query_as::<_, ShelterRecord>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the records of a shelter, newest first
    pub async fn list_by_shelter(
        pool: &PgPool,
        family: RecordFamily,
        shelter_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT id, shelter_id, name, details, created_at FROM {}
            WHERE shelter_id = $1
            ORDER BY created_at DESC
            "#,
            family.table()
        );

        sqlx::query_as::<_, ShelterRecord>(&sql)
            .bind(shelter_id)
            .fetch_all(pool)
            .await
    }

    /// Deletes a record; returns true if a row was removed
    pub async fn delete(pool: &PgPool, family: RecordFamily, id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", family.table());

        let result = sqlx::query(&sql).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the owning shelter of a record
    pub async fn shelter_id_of(
        pool: &PgPool,
        family: RecordFamily,
        id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let sql = format!("SELECT shelter_id FROM {} WHERE id = $1", family.table());

        sqlx::query_scalar(&sql).bind(id).fetch_optional(pool).await
    }
}
