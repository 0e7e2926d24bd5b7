//! PostgreSQL-backed tenant store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult, TenantStore};
use crate::db::pool::health_check;
use crate::models::module_volunteer::ModuleVolunteer;
use crate::models::record::{NewRecord, RecordFamily, ResourceFamily, ShelterRecord};
use crate::models::shelter::{CreateShelter, Shelter};
use crate::models::shelter_module::{CreateShelterModule, ModuleChanges, ShelterModule};
use crate::models::user::{CreateUser, User};
use crate::models::user_shelter::{CreateUserShelter, UserShelter};
use crate::models::volunteer::{CreateVolunteer, Volunteer};

/// Tenant store over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations and pool stats
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-constraint violations to `Conflict`, everything else to `Database`
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(map_insert_error)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn create_shelter(&self, data: CreateShelter) -> StoreResult<Shelter> {
        Shelter::create(&self.pool, data).await.map_err(map_insert_error)
    }

    async fn find_shelter(&self, id: Uuid) -> StoreResult<Option<Shelter>> {
        Ok(Shelter::find_by_id(&self.pool, id).await?)
    }

    async fn list_shelters(&self) -> StoreResult<Vec<Shelter>> {
        Ok(Shelter::list_all(&self.pool).await?)
    }

    async fn create_user_shelter(&self, data: CreateUserShelter) -> StoreResult<UserShelter> {
        UserShelter::create(&self.pool, data)
            .await
            .map_err(map_insert_error)
    }

    async fn find_user_shelter(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<UserShelter>> {
        Ok(UserShelter::find(&self.pool, user_id, shelter_id).await?)
    }

    async fn create_volunteer(&self, data: CreateVolunteer) -> StoreResult<Volunteer> {
        Volunteer::create(&self.pool, data)
            .await
            .map_err(map_insert_error)
    }

    async fn find_volunteer(&self, id: Uuid) -> StoreResult<Option<Volunteer>> {
        Ok(Volunteer::find_by_id(&self.pool, id).await?)
    }

    async fn find_volunteer_by_user(&self, user_id: Uuid) -> StoreResult<Option<Volunteer>> {
        Ok(Volunteer::find_by_user_id(&self.pool, user_id).await?)
    }

    async fn find_volunteer_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<Volunteer>> {
        Ok(Volunteer::find_in_shelter(&self.pool, id, shelter_id).await?)
    }

    async fn find_volunteers_in_shelter(
        &self,
        ids: &[Uuid],
        shelter_id: Uuid,
    ) -> StoreResult<Vec<Volunteer>> {
        Ok(Volunteer::find_many_in_shelter(&self.pool, ids, shelter_id).await?)
    }

    async fn list_volunteers(&self) -> StoreResult<Vec<Volunteer>> {
        Ok(Volunteer::list_all(&self.pool).await?)
    }

    async fn create_module(&self, data: CreateShelterModule) -> StoreResult<ShelterModule> {
        ShelterModule::create(&self.pool, data)
            .await
            .map_err(map_insert_error)
    }

    async fn find_module(&self, id: Uuid) -> StoreResult<Option<ShelterModule>> {
        Ok(ShelterModule::find_by_id(&self.pool, id).await?)
    }

    async fn find_module_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<ShelterModule>> {
        Ok(ShelterModule::find_in_shelter(&self.pool, id, shelter_id).await?)
    }

    async fn find_modules_by_key(
        &self,
        shelter_id: Uuid,
        module_key: &str,
    ) -> StoreResult<Vec<ShelterModule>> {
        Ok(ShelterModule::find_by_key(&self.pool, shelter_id, module_key).await?)
    }

    async fn list_modules(&self, shelter_id: Uuid) -> StoreResult<Vec<ShelterModule>> {
        Ok(ShelterModule::list_by_shelter(&self.pool, shelter_id).await?)
    }

    async fn list_modules_with_responsible(
        &self,
        shelter_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<Vec<ShelterModule>> {
        Ok(ShelterModule::list_with_responsible(&self.pool, shelter_id, volunteer_id).await?)
    }

    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> StoreResult<ShelterModule> {
        ShelterModule::update(&self.pool, id, changes)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "module",
                id,
            })
    }

    async fn rename_module_key(&self, id: Uuid, module_key: &str) -> StoreResult<ShelterModule> {
        ShelterModule::rename_key(&self.pool, id, module_key)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "module",
                id,
            })
    }

    async fn is_module_volunteer(&self, module_id: Uuid, volunteer_id: Uuid) -> StoreResult<bool> {
        Ok(ModuleVolunteer::exists(&self.pool, module_id, volunteer_id).await?)
    }

    async fn list_module_volunteer_ids(&self, module_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(ModuleVolunteer::list_volunteer_ids(&self.pool, module_id).await?)
    }

    async fn add_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<u64> {
        Ok(ModuleVolunteer::add_many(&self.pool, module_id, volunteer_ids).await?)
    }

    async fn remove_module_volunteer(
        &self,
        module_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(ModuleVolunteer::remove(&self.pool, module_id, volunteer_id).await?)
    }

    async fn replace_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<()> {
        Ok(ModuleVolunteer::replace(&self.pool, module_id, volunteer_ids).await?)
    }

    async fn create_record(
        &self,
        family: RecordFamily,
        data: NewRecord,
    ) -> StoreResult<ShelterRecord> {
        Ok(ShelterRecord::create(&self.pool, family, data).await?)
    }

    async fn find_record(
        &self,
        family: RecordFamily,
        id: Uuid,
    ) -> StoreResult<Option<ShelterRecord>> {
        Ok(ShelterRecord::find_by_id(&self.pool, family, id).await?)
    }

    async fn list_records(
        &self,
        family: RecordFamily,
        shelter_id: Uuid,
    ) -> StoreResult<Vec<ShelterRecord>> {
        Ok(ShelterRecord::list_by_shelter(&self.pool, family, shelter_id).await?)
    }

    async fn delete_record(&self, family: RecordFamily, id: Uuid) -> StoreResult<bool> {
        Ok(ShelterRecord::delete(&self.pool, family, id).await?)
    }

    async fn shelter_id_of(&self, family: ResourceFamily, id: Uuid) -> StoreResult<Option<Uuid>> {
        let shelter_id = match family {
            ResourceFamily::Record(family) => {
                ShelterRecord::shelter_id_of(&self.pool, family, id).await?
            }
            ResourceFamily::Volunteer => Volunteer::shelter_id_of(&self.pool, id).await?,
        };
        Ok(shelter_id)
    }
}
