/// Tenant store abstraction
///
/// Every read and write the permission engine and the module coordinator
/// need goes through [`TenantStore`]. Two implementations exist:
///
/// - [`PgTenantStore`]: PostgreSQL via sqlx, delegating to `models`
/// - [`InMemoryTenantStore`]: a lock-protected in-process store used by tests
///   and local demos
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::store::{PgTenantStore, TenantStore};
/// use shelterhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn TenantStore> = Arc::new(PgTenantStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::InMemoryTenantStore;
pub use postgres::PgTenantStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::record::{NewRecord, RecordFamily, ResourceFamily, ShelterRecord};
use crate::models::shelter::{CreateShelter, Shelter};
use crate::models::shelter_module::{CreateShelterModule, ModuleChanges, ShelterModule};
use crate::models::user::{CreateUser, User};
use crate::models::user_shelter::{CreateUserShelter, UserShelter};
use crate::models::volunteer::{CreateVolunteer, Volunteer};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations over the tenant data
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Verifies the backing storage is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    // Shelters

    async fn create_shelter(&self, data: CreateShelter) -> StoreResult<Shelter>;

    async fn find_shelter(&self, id: Uuid) -> StoreResult<Option<Shelter>>;

    async fn list_shelters(&self) -> StoreResult<Vec<Shelter>>;

    // Shelter roles

    /// Grants a role; fails with `Conflict` if the pair already has one
    async fn create_user_shelter(&self, data: CreateUserShelter) -> StoreResult<UserShelter>;

    async fn find_user_shelter(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<UserShelter>>;

    // Volunteers

    /// Creates a volunteer; fails with `Conflict` if the user already volunteers
    async fn create_volunteer(&self, data: CreateVolunteer) -> StoreResult<Volunteer>;

    async fn find_volunteer(&self, id: Uuid) -> StoreResult<Option<Volunteer>>;

    async fn find_volunteer_by_user(&self, user_id: Uuid) -> StoreResult<Option<Volunteer>>;

    async fn find_volunteer_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<Volunteer>>;

    /// Returns the subset of `ids` that are volunteers of the shelter
    async fn find_volunteers_in_shelter(
        &self,
        ids: &[Uuid],
        shelter_id: Uuid,
    ) -> StoreResult<Vec<Volunteer>>;

    async fn list_volunteers(&self) -> StoreResult<Vec<Volunteer>>;

    // Modules

    async fn create_module(&self, data: CreateShelterModule) -> StoreResult<ShelterModule>;

    async fn find_module(&self, id: Uuid) -> StoreResult<Option<ShelterModule>>;

    async fn find_module_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<ShelterModule>>;

    /// Finds rows of a shelter by stored key (oldest first)
    async fn find_modules_by_key(
        &self,
        shelter_id: Uuid,
        module_key: &str,
    ) -> StoreResult<Vec<ShelterModule>>;

    async fn list_modules(&self, shelter_id: Uuid) -> StoreResult<Vec<ShelterModule>>;

    async fn list_modules_with_responsible(
        &self,
        shelter_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<Vec<ShelterModule>>;

    /// Applies changes; fails with `NotFound` if the module does not exist
    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> StoreResult<ShelterModule>;

    async fn rename_module_key(&self, id: Uuid, module_key: &str) -> StoreResult<ShelterModule>;

    // Module associations

    async fn is_module_volunteer(&self, module_id: Uuid, volunteer_id: Uuid) -> StoreResult<bool>;

    async fn list_module_volunteer_ids(&self, module_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Adds associations, skipping existing pairs; returns rows inserted
    async fn add_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<u64>;

    async fn remove_module_volunteer(
        &self,
        module_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<bool>;

    /// Replaces the whole association set in one step
    async fn replace_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<()>;

    // Records

    async fn create_record(&self, family: RecordFamily, data: NewRecord)
        -> StoreResult<ShelterRecord>;

    async fn find_record(&self, family: RecordFamily, id: Uuid)
        -> StoreResult<Option<ShelterRecord>>;

    async fn list_records(
        &self,
        family: RecordFamily,
        shelter_id: Uuid,
    ) -> StoreResult<Vec<ShelterRecord>>;

    async fn delete_record(&self, family: RecordFamily, id: Uuid) -> StoreResult<bool>;

    /// Reverse lookup: the shelter owning a record or volunteer
    async fn shelter_id_of(&self, family: ResourceFamily, id: Uuid) -> StoreResult<Option<Uuid>>;
}
