/// Module-scoped capability resolution
///
/// Decides whether a user holds a [`Capability`] inside one shelter. The
/// decision combines four facts read from the [`TenantStore`]:
///
/// 1. Tenant ownership (`shelters.owner_id`)
/// 2. The per-shelter role (`user_shelters.role`)
/// 3. Module responsibility (`shelter_modules.responsible_volunteer_id`)
/// 4. Module association (`module_volunteers`)
///
/// # Policy
///
/// Each capability is an ordered list of [`Predicate`]s. Evaluation stops at
/// the first predicate that allows; if none does, the capability is denied.
///
/// | Capability | Predicates |
/// |---|---|
/// | READ   | shelter admin, shelter volunteer |
/// | WRITE  | shelter admin, module contributor (responsible or associated) |
/// | MANAGE | shelter admin, module responsible |
///
/// Association grants WRITE but never MANAGE: the responsible volunteer acts
/// as the module's administrator, associated volunteers are contributors.
///
/// # Missing input
///
/// A missing user, shelter, module key or module id never raises an error;
/// the check simply returns `Ok(false)`. Only storage failures surface as
/// `Err`.
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::auth::permissions::{AccessQuery, Capability, PermissionResolver};
/// use shelterhub_shared::store::InMemoryTenantStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, shelter_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTenantStore::new();
/// let resolver = PermissionResolver::new(&store);
///
/// let query = AccessQuery::new(Some(user_id), Some(shelter_id)).with_module_key(Some("animals"));
/// let allowed = resolver.check(Capability::Write, &query).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::models::user_shelter::ShelterRole;
use crate::models::volunteer::Volunteer;
use crate::store::{StoreResult, TenantStore};

/// The three levels of module access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Read,
    Write,
    Manage,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Manage => "manage",
        }
    }

    /// Ordered predicates granting this capability
    pub fn policy(&self) -> &'static [Predicate] {
        match self {
            Capability::Read => &[Predicate::ShelterAdmin, Predicate::ShelterVolunteer],
            Capability::Write => &[Predicate::ShelterAdmin, Predicate::ModuleContributor],
            Capability::Manage => &[Predicate::ShelterAdmin, Predicate::ModuleResponsible],
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single allow rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Owner of the shelter, or holds an owner/admin role in it
    ShelterAdmin,

    /// Has a volunteer record in the shelter (status ignored)
    ShelterVolunteer,

    /// Volunteer of the shelter that is responsible for, or associated with,
    /// a module carrying the query's key
    ModuleContributor,

    /// Volunteer of the shelter that is the responsible volunteer of the
    /// module identified by the query's id
    ModuleResponsible,
}

/// The identifiers a permission check is evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessQuery {
    pub user_id: Option<Uuid>,
    pub shelter_id: Option<Uuid>,
    pub module_key: Option<String>,
    pub module_id: Option<Uuid>,
}

impl AccessQuery {
    pub fn new(user_id: Option<Uuid>, shelter_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            shelter_id,
            ..Default::default()
        }
    }

    /// Sets the module key; empty strings are treated as absent
    pub fn with_module_key(mut self, module_key: Option<&str>) -> Self {
        self.module_key = module_key
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_module_id(mut self, module_id: Option<Uuid>) -> Self {
        self.module_id = module_id;
        self
    }
}

/// Evaluates capabilities against a tenant store
pub struct PermissionResolver<'a> {
    store: &'a dyn TenantStore,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(store: &'a dyn TenantStore) -> Self {
        Self { store }
    }

    /// Evaluates a capability's predicate list in order
    pub async fn check(&self, capability: Capability, query: &AccessQuery) -> StoreResult<bool> {
        let (Some(_), Some(_)) = (query.user_id, query.shelter_id) else {
            return Ok(false);
        };

        for predicate in capability.policy() {
            if self.evaluate(*predicate, query).await? {
                debug!(
                    capability = %capability,
                    predicate = ?predicate,
                    user_id = ?query.user_id,
                    shelter_id = ?query.shelter_id,
                    "Capability granted"
                );
                return Ok(true);
            }
        }

        debug!(
            capability = %capability,
            user_id = ?query.user_id,
            shelter_id = ?query.shelter_id,
            module_key = ?query.module_key,
            module_id = ?query.module_id,
            "Capability denied"
        );
        Ok(false)
    }

    async fn evaluate(&self, predicate: Predicate, query: &AccessQuery) -> StoreResult<bool> {
        let (Some(user_id), Some(shelter_id)) = (query.user_id, query.shelter_id) else {
            return Ok(false);
        };

        match predicate {
            Predicate::ShelterAdmin => self.is_admin_in_shelter(user_id, shelter_id).await,
            Predicate::ShelterVolunteer => {
                Ok(self.volunteer_in_shelter(user_id, shelter_id).await?.is_some())
            }
            Predicate::ModuleContributor => {
                let Some(module_key) = query.module_key.as_deref() else {
                    return Ok(false);
                };
                let Some(volunteer) = self.volunteer_in_shelter(user_id, shelter_id).await? else {
                    return Ok(false);
                };
                self.contributes_to(&volunteer, shelter_id, module_key).await
            }
            Predicate::ModuleResponsible => {
                let Some(module_id) = query.module_id else {
                    return Ok(false);
                };
                let Some(volunteer) = self.volunteer_in_shelter(user_id, shelter_id).await? else {
                    return Ok(false);
                };
                let module = self.store.find_module_in_shelter(module_id, shelter_id).await?;
                Ok(module.and_then(|m| m.responsible_volunteer_id) == Some(volunteer.id))
            }
        }
    }

    /// The user's volunteer record, if it belongs to the shelter
    async fn volunteer_in_shelter(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<Volunteer>> {
        let volunteer = self.store.find_volunteer_by_user(user_id).await?;
        Ok(volunteer.filter(|v| v.shelter_id == shelter_id))
    }

    async fn contributes_to(
        &self,
        volunteer: &Volunteer,
        shelter_id: Uuid,
        module_key: &str,
    ) -> StoreResult<bool> {
        let modules = self.store.find_modules_by_key(shelter_id, module_key).await?;

        if modules
            .iter()
            .any(|m| m.responsible_volunteer_id == Some(volunteer.id))
        {
            return Ok(true);
        }

        for module in &modules {
            if self.store.is_module_volunteer(module.id, volunteer.id).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Owner of the shelter, or holds an owner/admin role in it
    pub async fn is_admin_in_shelter(&self, user_id: Uuid, shelter_id: Uuid) -> StoreResult<bool> {
        if let Some(shelter) = self.store.find_shelter(shelter_id).await? {
            if shelter.owner_id == user_id {
                return Ok(true);
            }
        }

        let role = self.get_user_role_in_shelter(user_id, shelter_id).await?;
        Ok(role.is_some_and(|r| r.is_admin()))
    }

    /// Owner of the shelter, or holds the owner role in it
    pub async fn is_owner_of_shelter(&self, user_id: Uuid, shelter_id: Uuid) -> StoreResult<bool> {
        if let Some(shelter) = self.store.find_shelter(shelter_id).await? {
            if shelter.owner_id == user_id {
                return Ok(true);
            }
        }

        let role = self.get_user_role_in_shelter(user_id, shelter_id).await?;
        Ok(role == Some(ShelterRole::Owner))
    }

    /// The user's recorded role in the shelter, if any
    pub async fn get_user_role_in_shelter(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<Option<ShelterRole>> {
        let row = self.store.find_user_shelter(user_id, shelter_id).await?;
        Ok(row.map(|r| r.role))
    }

    pub async fn can_read_module(
        &self,
        user_id: Option<Uuid>,
        shelter_id: Option<Uuid>,
    ) -> StoreResult<bool> {
        self.check(Capability::Read, &AccessQuery::new(user_id, shelter_id))
            .await
    }

    pub async fn can_write_in_module(
        &self,
        user_id: Option<Uuid>,
        module_key: Option<&str>,
        shelter_id: Option<Uuid>,
    ) -> StoreResult<bool> {
        let query = AccessQuery::new(user_id, shelter_id).with_module_key(module_key);
        if query.module_key.is_none() {
            return Ok(false);
        }
        self.check(Capability::Write, &query).await
    }

    pub async fn can_manage_module(
        &self,
        user_id: Option<Uuid>,
        module_id: Option<Uuid>,
        shelter_id: Option<Uuid>,
    ) -> StoreResult<bool> {
        if module_id.is_none() {
            return Ok(false);
        }
        let query = AccessQuery::new(user_id, shelter_id).with_module_id(module_id);
        self.check(Capability::Manage, &query).await
    }

    /// Shelter-level management (edit or delete the shelter itself)
    pub async fn can_manage_shelter(&self, user_id: Uuid, shelter_id: Uuid) -> StoreResult<bool> {
        self.is_admin_in_shelter(user_id, shelter_id).await
    }

    /// Enabling or disabling modules of the shelter
    pub async fn can_manage_module_activation(
        &self,
        user_id: Uuid,
        shelter_id: Uuid,
    ) -> StoreResult<bool> {
        self.is_admin_in_shelter(user_id, shelter_id).await
    }
}
