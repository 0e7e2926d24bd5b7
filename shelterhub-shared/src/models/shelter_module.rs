/// Shelter module model and database operations
///
/// A shelter is split into named functional areas ("modules"). Each module
/// row carries an activation flag and at most one responsible volunteer.
/// A well-formed shelter has exactly one row per [`ModuleKey`]; rows with
/// unrecognized keys can exist in drifted data and are handled by
/// `modules::repair`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE shelter_modules (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     shelter_id UUID NOT NULL REFERENCES shelters(id) ON DELETE CASCADE,
///     module_key VARCHAR(64) NOT NULL,
///     active BOOLEAN NOT NULL DEFAULT FALSE,
///     responsible_volunteer_id UUID REFERENCES volunteers(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `module_key` is stored as text rather than an enum type so that legacy
/// keys survive until they are repaired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Key used by older data for the people module
pub const LEGACY_PEOPLE_KEY: &str = "shelteredPeople";

/// The recognized module keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKey {
    People,
    Resources,
    Volunteers,
    Animals,
    Reports,
}

impl ModuleKey {
    /// Every recognized key, in provisioning order
    pub const ALL: [ModuleKey; 5] = [
        ModuleKey::People,
        ModuleKey::Resources,
        ModuleKey::Volunteers,
        ModuleKey::Animals,
        ModuleKey::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::People => "people",
            ModuleKey::Resources => "resources",
            ModuleKey::Volunteers => "volunteers",
            ModuleKey::Animals => "animals",
            ModuleKey::Reports => "reports",
        }
    }

    /// Parses a stored key; legacy and unknown keys return None
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    /// Activation state for newly created rows
    ///
    /// people, resources and volunteers start active; animals and reports
    /// start inactive.
    pub fn default_active(&self) -> bool {
        matches!(
            self,
            ModuleKey::People | ModuleKey::Resources | ModuleKey::Volunteers
        )
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized module key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module key: {0}")]
pub struct UnknownModuleKey(pub String);

impl FromStr for ModuleKey {
    type Err = UnknownModuleKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownModuleKey(s.to_string()))
    }
}

/// A module of one shelter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShelterModule {
    /// Unique module ID (UUID v4)
    pub id: Uuid,

    /// Owning shelter
    pub shelter_id: Uuid,

    /// Module key as stored (may be legacy or unknown in drifted data)
    pub module_key: String,

    /// Whether the module is enabled for the shelter
    pub active: bool,

    /// Volunteer responsible for the module, if any
    pub responsible_volunteer_id: Option<Uuid>,

    /// When the module was created
    pub created_at: DateTime<Utc>,

    /// When the module was last changed
    pub updated_at: DateTime<Utc>,
}

impl ShelterModule {
    /// The parsed key, or None for legacy/unknown keys
    pub fn key(&self) -> Option<ModuleKey> {
        ModuleKey::parse(&self.module_key)
    }
}

/// Input for creating a module row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShelterModule {
    pub shelter_id: Uuid,
    pub module_key: String,
    pub active: bool,
    pub responsible_volunteer_id: Option<Uuid>,
}

impl CreateShelterModule {
    /// A row for `key` with the default activation policy
    pub fn with_defaults(shelter_id: Uuid, key: ModuleKey) -> Self {
        Self {
            shelter_id,
            module_key: key.as_str().to_string(),
            active: key.default_active(),
            responsible_volunteer_id: None,
        }
    }
}

/// Field changes applied by [`ShelterModule::update`]
///
/// `responsible_volunteer_id` is doubly optional: outer None leaves the
/// column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleChanges {
    pub active: Option<bool>,
    pub responsible_volunteer_id: Option<Option<Uuid>>,
}

impl ModuleChanges {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.responsible_volunteer_id.is_none()
    }
}

const MODULE_COLUMNS: &str =
    "id, shelter_id, module_key, active, responsible_volunteer_id, created_at, updated_at";

impl ShelterModule {
    /// Creates a module row
    pub async fn create(pool: &PgPool, data: CreateShelterModule) -> Result<Self, sqlx::Error> {
        let module = sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            INSERT INTO shelter_modules (shelter_id, module_key, active, responsible_volunteer_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(data.shelter_id)
        .bind(data.module_key)
        .bind(data.active)
        .bind(data.responsible_volunteer_id)
        .fetch_one(pool)
        .await?;

        Ok(module)
    }

    /// Finds a module by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            "SELECT {MODULE_COLUMNS} FROM shelter_modules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a module only if it belongs to the given shelter
    pub async fn find_in_shelter(
        pool: &PgPool,
        id: Uuid,
        shelter_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            "SELECT {MODULE_COLUMNS} FROM shelter_modules WHERE id = $1 AND shelter_id = $2"
        ))
        .bind(id)
        .bind(shelter_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds all rows of a shelter with the given stored key
    ///
    /// Normally returns zero or one row; drifted data may hold duplicates.
    pub async fn find_by_key(
        pool: &PgPool,
        shelter_id: Uuid,
        module_key: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            SELECT {MODULE_COLUMNS} FROM shelter_modules
            WHERE shelter_id = $1 AND module_key = $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(shelter_id)
        .bind(module_key)
        .fetch_all(pool)
        .await
    }

    /// Lists all modules of a shelter, oldest first
    pub async fn list_by_shelter(
        pool: &PgPool,
        shelter_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            SELECT {MODULE_COLUMNS} FROM shelter_modules
            WHERE shelter_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(shelter_id)
        .fetch_all(pool)
        .await
    }

    /// Lists the modules of a shelter a volunteer is responsible for
    pub async fn list_with_responsible(
        pool: &PgPool,
        shelter_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            SELECT {MODULE_COLUMNS} FROM shelter_modules
            WHERE shelter_id = $1 AND responsible_volunteer_id = $2
            "#
        ))
        .bind(shelter_id)
        .bind(volunteer_id)
        .fetch_all(pool)
        .await
    }

    /// Applies field changes and bumps `updated_at`
    ///
    /// Returns None if the module does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: ModuleChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let set_responsible = changes.responsible_volunteer_id.is_some();
        let responsible = changes.responsible_volunteer_id.flatten();

        sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            UPDATE shelter_modules
            SET active = COALESCE($2, active),
                responsible_volunteer_id = CASE WHEN $3 THEN $4 ELSE responsible_volunteer_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.active)
        .bind(set_responsible)
        .bind(responsible)
        .fetch_optional(pool)
        .await
    }

    /// Rewrites the stored key of a row
    pub async fn rename_key(
        pool: &PgPool,
        id: Uuid,
        module_key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShelterModule>(&format!(
            r#"
            UPDATE shelter_modules
            SET module_key = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {MODULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(module_key)
        .fetch_optional(pool)
        .await
    }
}
