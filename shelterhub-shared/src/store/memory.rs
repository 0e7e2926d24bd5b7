/// In-memory tenant store
///
/// Keeps every table in process behind a single `tokio::sync::RwLock`. It
/// enforces the same uniqueness rules as the PostgreSQL schema (user email,
/// volunteer user, role pair, association pair) so code exercised against it
/// behaves like it would against the database.
///
/// The store can be switched into a failing mode where every call returns a
/// database error, to exercise storage-failure paths.
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::store::{InMemoryTenantStore, TenantStore};
/// use shelterhub_shared::models::user::CreateUser;
///
/// # async fn example() {
/// let store = InMemoryTenantStore::new();
/// let user = store
///     .create_user(CreateUser { email: "ana@example.com".into(), name: "Ana".into() })
///     .await
///     .unwrap();
/// assert!(store.find_user(user.id).await.unwrap().is_some());
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TenantStore};
use crate::models::module_volunteer::ModuleVolunteer;
use crate::models::record::{NewRecord, RecordFamily, ResourceFamily, ShelterRecord};
use crate::models::shelter::{CreateShelter, Shelter};
use crate::models::shelter_module::{CreateShelterModule, ModuleChanges, ShelterModule};
use crate::models::user::{CreateUser, User};
use crate::models::user_shelter::{CreateUserShelter, UserShelter};
use crate::models::volunteer::{CreateVolunteer, Volunteer, VolunteerStatus};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    shelters: Vec<Shelter>,
    user_shelters: HashMap<(Uuid, Uuid), UserShelter>,
    volunteers: Vec<Volunteer>,
    modules: Vec<ShelterModule>,
    module_volunteers: Vec<ModuleVolunteer>,
    records: HashMap<RecordFamily, Vec<ShelterRecord>>,
}

/// Tenant store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    state: RwLock<State>,
    failing: AtomicBool,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a database error (or stop failing)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.check()?;
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                data.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_shelter(&self, data: CreateShelter) -> StoreResult<Shelter> {
        self.check()?;
        let mut state = self.state.write().await;
        let shelter = Shelter {
            id: Uuid::new_v4(),
            name: data.name,
            owner_id: data.owner_id,
            active: true,
            created_at: Utc::now(),
        };
        state.shelters.push(shelter.clone());
        Ok(shelter)
    }

    async fn find_shelter(&self, id: Uuid) -> StoreResult<Option<Shelter>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.shelters.iter().find(|s| s.id == id).cloned())
    }

    async fn list_shelters(&self) -> StoreResult<Vec<Shelter>> {
        self.check()?;
        Ok(self.state.read().await.shelters.clone())
    }

    async fn create_user_shelter(&self, data: CreateUserShelter) -> StoreResult<UserShelter> {
        self.check()?;
        let mut state = self.state.write().await;
        let key = (data.user_id, data.shelter_id);
        if state.user_shelters.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "user {} already has a role in shelter {}",
                data.user_id, data.shelter_id
            )));
        }
        let row = UserShelter {
            user_id: data.user_id,
            shelter_id: data.shelter_id,
            role: data.role,
            created_at: Utc::now(),
        };
        state.user_shelters.insert(key, row.clone());
        Ok(row)
    }

    async fn find_user_shelter(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<UserShelter>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.user_shelters.get(&(user_id, shelter_id)).cloned())
    }

    async fn create_volunteer(&self, data: CreateVolunteer) -> StoreResult<Volunteer> {
        self.check()?;
        let mut state = self.state.write().await;
        if state.volunteers.iter().any(|v| v.user_id == data.user_id) {
            return Err(StoreError::Conflict(format!(
                "user {} is already a volunteer",
                data.user_id
            )));
        }
        let volunteer = Volunteer {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            shelter_id: data.shelter_id,
            status: VolunteerStatus::Active,
            created_at: Utc::now(),
        };
        state.volunteers.push(volunteer.clone());
        Ok(volunteer)
    }

    async fn find_volunteer(&self, id: Uuid) -> StoreResult<Option<Volunteer>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.volunteers.iter().find(|v| v.id == id).cloned())
    }

    async fn find_volunteer_by_user(&self, user_id: Uuid) -> StoreResult<Option<Volunteer>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.volunteers.iter().find(|v| v.user_id == user_id).cloned())
    }

    async fn find_volunteer_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<Volunteer>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .volunteers
            .iter()
            .find(|v| v.id == id && v.shelter_id == shelter_id)
            .cloned())
    }

    async fn find_volunteers_in_shelter(
        &self,
        ids: &[Uuid],
        shelter_id: Uuid,
    ) -> StoreResult<Vec<Volunteer>> {
        self.check()?;
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let state = self.state.read().await;
        Ok(state
            .volunteers
            .iter()
            .filter(|v| v.shelter_id == shelter_id && wanted.contains(&v.id))
            .cloned()
            .collect())
    }

    async fn list_volunteers(&self) -> StoreResult<Vec<Volunteer>> {
        self.check()?;
        Ok(self.state.read().await.volunteers.clone())
    }

    async fn create_module(&self, data: CreateShelterModule) -> StoreResult<ShelterModule> {
        self.check()?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let module = ShelterModule {
            id: Uuid::new_v4(),
            shelter_id: data.shelter_id,
            module_key: data.module_key,
            active: data.active,
            responsible_volunteer_id: data.responsible_volunteer_id,
            created_at: now,
            updated_at: now,
        };
        state.modules.push(module.clone());
        Ok(module)
    }

    async fn find_module(&self, id: Uuid) -> StoreResult<Option<ShelterModule>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.modules.iter().find(|m| m.id == id).cloned())
    }

    async fn find_module_in_shelter(
        &self,
        id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<ShelterModule>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .modules
            .iter()
            .find(|m| m.id == id && m.shelter_id == shelter_id)
            .cloned())
    }

    async fn find_modules_by_key(
        &self,
        shelter_id: Uuid,
        module_key: &str,
    ) -> StoreResult<Vec<ShelterModule>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .modules
            .iter()
            .filter(|m| m.shelter_id == shelter_id && m.module_key == module_key)
            .cloned()
            .collect())
    }

    async fn list_modules(&self, shelter_id: Uuid) -> StoreResult<Vec<ShelterModule>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .modules
            .iter()
            .filter(|m| m.shelter_id == shelter_id)
            .cloned()
            .collect())
    }

    async fn list_modules_with_responsible(
        &self,
        shelter_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<Vec<ShelterModule>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .modules
            .iter()
            .filter(|m| {
                m.shelter_id == shelter_id && m.responsible_volunteer_id == Some(volunteer_id)
            })
            .cloned()
            .collect())
    }

    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> StoreResult<ShelterModule> {
        self.check()?;
        let mut state = self.state.write().await;
        let module = state
            .modules
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound {
                entity: "module",
                id,
            })?;

        if let Some(active) = changes.active {
            module.active = active;
        }
        if let Some(responsible) = changes.responsible_volunteer_id {
            module.responsible_volunteer_id = responsible;
        }
        module.updated_at = Utc::now();
        Ok(module.clone())
    }

    async fn rename_module_key(&self, id: Uuid, module_key: &str) -> StoreResult<ShelterModule> {
        self.check()?;
        let mut state = self.state.write().await;
        let module = state
            .modules
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound {
                entity: "module",
                id,
            })?;
        module.module_key = module_key.to_string();
        module.updated_at = Utc::now();
        Ok(module.clone())
    }

    async fn is_module_volunteer(&self, module_id: Uuid, volunteer_id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .module_volunteers
            .iter()
            .any(|mv| mv.module_id == module_id && mv.volunteer_id == volunteer_id))
    }

    async fn list_module_volunteer_ids(&self, module_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .module_volunteers
            .iter()
            .filter(|mv| mv.module_id == module_id)
            .map(|mv| mv.volunteer_id)
            .collect())
    }

    async fn add_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<u64> {
        self.check()?;
        let mut state = self.state.write().await;
        Ok(insert_associations(&mut state, module_id, volunteer_ids))
    }

    async fn remove_module_volunteer(
        &self,
        module_id: Uuid,
        volunteer_id: Uuid,
    ) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        let before = state.module_volunteers.len();
        state
            .module_volunteers
            .retain(|mv| !(mv.module_id == module_id && mv.volunteer_id == volunteer_id));
        Ok(state.module_volunteers.len() < before)
    }

    async fn replace_module_volunteers(
        &self,
        module_id: Uuid,
        volunteer_ids: &[Uuid],
    ) -> StoreResult<()> {
        self.check()?;
        let mut state = self.state.write().await;
        state.module_volunteers.retain(|mv| mv.module_id != module_id);
        insert_associations(&mut state, module_id, volunteer_ids);
        Ok(())
    }

    async fn create_record(
        &self,
        family: RecordFamily,
        data: NewRecord,
    ) -> StoreResult<ShelterRecord> {
        self.check()?;
        let mut state = self.state.write().await;
        let record = ShelterRecord {
            id: Uuid::new_v4(),
            shelter_id: data.shelter_id,
            name: data.name,
            details: data.details,
            created_at: Utc::now(),
        };
        state.records.entry(family).or_default().push(record.clone());
        Ok(record)
    }

    async fn find_record(
        &self,
        family: RecordFamily,
        id: Uuid,
    ) -> StoreResult<Option<ShelterRecord>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&family)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn list_records(
        &self,
        family: RecordFamily,
        shelter_id: Uuid,
    ) -> StoreResult<Vec<ShelterRecord>> {
        self.check()?;
        let state = self.state.read().await;
        let mut rows: Vec<ShelterRecord> = state
            .records
            .get(&family)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.shelter_id == shelter_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.reverse();
        Ok(rows)
    }

    async fn delete_record(&self, family: RecordFamily, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(rows) = state.records.get_mut(&family) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn shelter_id_of(&self, family: ResourceFamily, id: Uuid) -> StoreResult<Option<Uuid>> {
        self.check()?;
        let state = self.state.read().await;
        let shelter_id = match family {
            ResourceFamily::Record(family) => state
                .records
                .get(&family)
                .and_then(|rows| rows.iter().find(|r| r.id == id))
                .map(|r| r.shelter_id),
            ResourceFamily::Volunteer => state
                .volunteers
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.shelter_id),
        };
        Ok(shelter_id)
    }
}

fn insert_associations(state: &mut State, module_id: Uuid, volunteer_ids: &[Uuid]) -> u64 {
    let mut inserted = 0;
    for &volunteer_id in volunteer_ids {
        let exists = state
            .module_volunteers
            .iter()
            .any(|mv| mv.module_id == module_id && mv.volunteer_id == volunteer_id);
        if !exists {
            state.module_volunteers.push(ModuleVolunteer {
                module_id,
                volunteer_id,
                created_at: Utc::now(),
            });
            inserted += 1;
        }
    }
    inserted
}
