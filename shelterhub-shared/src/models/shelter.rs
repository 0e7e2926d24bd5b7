/// Shelter model and database operations
///
/// A shelter is the tenant of the system: every authorization decision is
/// scoped to exactly one shelter. Each shelter has exactly one owner at any
/// time; ownership only changes through an explicit update.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE shelters (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Shelter (tenant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shelter {
    /// Unique shelter ID (UUID v4)
    pub id: Uuid,

    /// Shelter name
    pub name: String,

    /// The single owning user
    pub owner_id: Uuid,

    /// Whether the shelter is currently operating
    pub active: bool,

    /// When the shelter was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new shelter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShelter {
    /// Shelter name
    pub name: String,

    /// Creating user, recorded as owner
    pub owner_id: Uuid,
}

impl Shelter {
    /// Creates a new shelter row
    ///
    /// Only the shelter itself is inserted; default modules and the owner's
    /// role row are created by `modules::provisioning::create_shelter`.
    pub async fn create(pool: &PgPool, data: CreateShelter) -> Result<Self, sqlx::Error> {
        let shelter = sqlx::query_as::<_, Shelter>(
            r#"
            INSERT INTO shelters (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, active, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(shelter)
    }

    /// Finds a shelter by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let shelter = sqlx::query_as::<_, Shelter>(
            r#"
            SELECT id, name, owner_id, active, created_at
            FROM shelters
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(shelter)
    }

    /// Lists every shelter, oldest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let shelters = sqlx::query_as::<_, Shelter>(
            r#"
            SELECT id, name, owner_id, active, created_at
            FROM shelters
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(shelters)
    }
}
