/// Shelter role model and database operations
///
/// Records the role a user holds inside a shelter. This is the many-to-many
/// join between users and shelters; the `(user_id, shelter_id)` pair is
/// unique.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE shelter_role AS ENUM ('owner', 'admin', 'volunteer');
///
/// CREATE TABLE user_shelters (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     shelter_id UUID NOT NULL REFERENCES shelters(id) ON DELETE CASCADE,
///     role shelter_role NOT NULL DEFAULT 'volunteer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, shelter_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: created together with the shelter
/// - **admin**: full control over every module of the shelter
/// - **volunteer**: created when a volunteer joins the shelter
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::models::user_shelter::{UserShelter, CreateUserShelter, ShelterRole};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, shelter_id: Uuid) -> Result<(), sqlx::Error> {
/// UserShelter::create(&pool, CreateUserShelter {
///     user_id,
///     shelter_id,
///     role: ShelterRole::Admin,
/// }).await?;
///
/// let role = UserShelter::get_role(&pool, user_id, shelter_id).await?;
/// assert_eq!(role, Some(ShelterRole::Admin));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Roles a user can hold inside a shelter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shelter_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShelterRole {
    /// Owner of the shelter
    Owner,

    /// Administrator with the same module rights as the owner
    Admin,

    /// Volunteer; module rights come from responsibility or association
    Volunteer,
}

impl ShelterRole {
    /// Converts role to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelterRole::Owner => "owner",
            ShelterRole::Admin => "admin",
            ShelterRole::Volunteer => "volunteer",
        }
    }

    /// Owners and admins bypass every module-level check
    pub fn is_admin(&self) -> bool {
        matches!(self, ShelterRole::Owner | ShelterRole::Admin)
    }
}

/// A user's role within one shelter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserShelter {
    /// User ID
    pub user_id: Uuid,

    /// Shelter ID
    pub shelter_id: Uuid,

    /// Role within the shelter
    pub role: ShelterRole,

    /// When the role was granted
    pub created_at: DateTime<Utc>,
}

/// Input for granting a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserShelter {
    /// User ID
    pub user_id: Uuid,

    /// Shelter ID
    pub shelter_id: Uuid,

    /// Role to grant (defaults to Volunteer)
    #[serde(default = "default_role")]
    pub role: ShelterRole,
}

fn default_role() -> ShelterRole {
    ShelterRole::Volunteer
}

impl UserShelter {
    /// Grants a role to a user inside a shelter
    ///
    /// # Errors
    ///
    /// Returns an error if the pair already has a role (unique constraint
    /// violation), or the user or shelter doesn't exist
    pub async fn create(pool: &PgPool, data: CreateUserShelter) -> Result<Self, sqlx::Error> {
        let user_shelter = sqlx::query_as::<_, UserShelter>(
            r#"
            INSERT INTO user_shelters (user_id, shelter_id, role)
            VALUES ($1, $2, $3)
            RETURNING user_id, shelter_id, role, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.shelter_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user_shelter)
    }

    /// Finds the role row for a user inside a shelter
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user_shelter = sqlx::query_as::<_, UserShelter>(
            r#"
            SELECT user_id, shelter_id, role, created_at
            FROM user_shelters
            WHERE user_id = $1 AND shelter_id = $2
            "#,
        )
        .bind(user_id)
        .bind(shelter_id)
        .fetch_optional(pool)
        .await?;

        Ok(user_shelter)
    }

    /// Gets a user's role in a shelter
    ///
    /// Returns None if the user holds no role in the shelter.
    pub async fn get_role(
        pool: &PgPool,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> Result<Option<ShelterRole>, sqlx::Error> {
        let role: Option<ShelterRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM user_shelters
            WHERE user_id = $1 AND shelter_id = $2
            "#,
        )
        .bind(user_id)
        .bind(shelter_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }
}
