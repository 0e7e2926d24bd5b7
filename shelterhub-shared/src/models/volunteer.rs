/// Volunteer model and database operations
///
/// A volunteer record is a user's membership in exactly one shelter:
/// `user_id` is unique, so a user can volunteer for at most one shelter.
/// Module responsibility and module association both point at volunteer
/// records, never at users directly.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE volunteer_status AS ENUM ('active', 'inactive');
///
/// CREATE TABLE volunteers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     shelter_id UUID NOT NULL REFERENCES shelters(id) ON DELETE CASCADE,
///     status volunteer_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Volunteer status
///
/// Status is informational only; permission checks ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "volunteer_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolunteerStatus {
    Active,
    Inactive,
}

/// Volunteer membership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    /// Unique volunteer ID (UUID v4)
    pub id: Uuid,

    /// The volunteering user (unique)
    pub user_id: Uuid,

    /// The shelter the user volunteers for
    pub shelter_id: Uuid,

    /// Current status
    pub status: VolunteerStatus,

    /// When the volunteer joined
    pub created_at: DateTime<Utc>,
}

/// Input for creating a volunteer record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolunteer {
    /// The volunteering user
    pub user_id: Uuid,

    /// The shelter joined
    pub shelter_id: Uuid,
}

impl Volunteer {
    /// Creates a volunteer record with status active
    ///
    /// # Errors
    ///
    /// Returns a unique constraint violation if the user already volunteers
    /// for a shelter
    pub async fn create(pool: &PgPool, data: CreateVolunteer) -> Result<Self, sqlx::Error> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            INSERT INTO volunteers (user_id, shelter_id)
            VALUES ($1, $2)
            RETURNING id, user_id, shelter_id, status, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.shelter_id)
        .fetch_one(pool)
        .await?;

        Ok(volunteer)
    }

    /// Finds a volunteer by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, shelter_id, status, created_at
            FROM volunteers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(volunteer)
    }

    /// Finds the volunteer record of a user, whatever the shelter
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, shelter_id, status, created_at
            FROM volunteers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(volunteer)
    }

    /// Finds a volunteer only if it belongs to the given shelter
    pub async fn find_in_shelter(
        pool: &PgPool,
        id: Uuid,
        shelter_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, shelter_id, status, created_at
            FROM volunteers
            WHERE id = $1 AND shelter_id = $2
            "#,
        )
        .bind(id)
        .bind(shelter_id)
        .fetch_optional(pool)
        .await?;

        Ok(volunteer)
    }

    /// Finds every volunteer from `ids` that belongs to the shelter
    ///
    /// Foreign or unknown ids are silently absent from the result; callers
    /// compare lengths to detect them.
    pub async fn find_many_in_shelter(
        pool: &PgPool,
        ids: &[Uuid],
        shelter_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let volunteers = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, shelter_id, status, created_at
            FROM volunteers
            WHERE id = ANY($1) AND shelter_id = $2
            "#,
        )
        .bind(ids)
        .bind(shelter_id)
        .fetch_all(pool)
        .await?;

        Ok(volunteers)
    }

    /// Lists all volunteers across shelters, oldest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let volunteers = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, shelter_id, status, created_at
            FROM volunteers
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(volunteers)
    }

    /// Returns the owning shelter of a volunteer record
    pub async fn shelter_id_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT shelter_id FROM volunteers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
