/// Module updates and the responsibility invariant
///
/// A responsible volunteer must be able to register new volunteers, so the
/// coordinator maintains:
///
/// > every volunteer responsible for at least one module of a shelter is
/// > associated with that shelter's `volunteers` module.
///
/// [`apply_module_update`] validates the whole patch and writes it. The
/// responsibility hook then runs around the association list replacement:
///
/// - Cleared: the previous responsible volunteer is released before the
///   list is applied, so a supplied list is kept as sent
/// - Set: the new responsible volunteer is associated after the list is
///   applied, so the invariant holds even for the `volunteers` module itself
/// - Omitted, or a change from one volunteer to another: nothing is
///   released
///
/// Both steps only add or remove `volunteers`-module associations and are
/// idempotent.
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::modules::coordinator::{apply_module_update, ModulePatch, Patch};
/// use shelterhub_shared::store::InMemoryTenantStore;
/// use uuid::Uuid;
///
/// # async fn example(shelter_id: Uuid, module_id: Uuid, volunteer_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTenantStore::new();
/// let patch = ModulePatch {
///     responsible_volunteer_id: Patch::Set(volunteer_id),
///     ..Default::default()
/// };
/// let details = apply_module_update(&store, shelter_id, module_id, patch).await?;
/// assert_eq!(details.module.responsible_volunteer_id, Some(volunteer_id));
/// # Ok(())
/// # }
/// ```

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::shelter_module::{CreateShelterModule, ModuleChanges, ModuleKey, ShelterModule};
use crate::store::{StoreError, TenantStore};

/// A field update that distinguishes "not sent" from "sent empty"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field absent from the payload; leave the stored value alone
    #[default]
    Omitted,

    /// Field sent as null or empty string; clear the stored value
    Cleared,

    /// Field sent with a value
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Patch::Omitted)
    }

    /// `None` when omitted, `Some(None)` when cleared, `Some(Some(v))` when set
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Omitted => None,
            Patch::Cleared => Some(None),
            Patch::Set(v) => Some(Some(v)),
        }
    }
}

// Used with #[serde(default)] so a missing field stays Omitted.
impl<'de> Deserialize<'de> for Patch<Uuid> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Patch::Cleared),
            Some(s) if s.trim().is_empty() => Ok(Patch::Cleared),
            Some(s) => Uuid::parse_str(s.trim())
                .map(Patch::Set)
                .map_err(de::Error::custom),
        }
    }
}

/// Partial update of a module
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub responsible_volunteer_id: Patch<Uuid>,

    /// Full replacement of the associated volunteers when present
    #[serde(default)]
    pub associated_volunteer_ids: Option<Vec<Uuid>>,
}

/// A module together with its associated volunteers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetails {
    #[serde(flatten)]
    pub module: ShelterModule,
    pub associated_volunteer_ids: Vec<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Shelter not found")]
    ShelterNotFound(Uuid),

    #[error("Module not found")]
    ModuleNotFound(Uuid),

    #[error("Responsible volunteer not found or does not belong to the shelter")]
    VolunteerNotFound(Uuid),

    #[error("One or more volunteers were not found or do not belong to the shelter")]
    ForeignVolunteers(Vec<Uuid>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loads a module of the shelter with its associations
pub async fn load_module(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    module_id: Uuid,
) -> Result<ModuleDetails, CoordinatorError> {
    let module = store
        .find_module_in_shelter(module_id, shelter_id)
        .await?
        .ok_or(CoordinatorError::ModuleNotFound(module_id))?;
    let associated_volunteer_ids = store.list_module_volunteer_ids(module.id).await?;

    Ok(ModuleDetails {
        module,
        associated_volunteer_ids,
    })
}

/// Lists the modules of a shelter ordered by key
pub async fn list_modules(
    store: &dyn TenantStore,
    shelter_id: Uuid,
) -> Result<Vec<ModuleDetails>, CoordinatorError> {
    store
        .find_shelter(shelter_id)
        .await?
        .ok_or(CoordinatorError::ShelterNotFound(shelter_id))?;

    let mut modules = store.list_modules(shelter_id).await?;
    modules.sort_by(|a, b| a.module_key.cmp(&b.module_key));

    let mut details = Vec::with_capacity(modules.len());
    for module in modules {
        let associated_volunteer_ids = store.list_module_volunteer_ids(module.id).await?;
        details.push(ModuleDetails {
            module,
            associated_volunteer_ids,
        });
    }
    Ok(details)
}

/// Applies a module patch and restores the responsibility invariant
///
/// Validation happens before any write: an unknown responsible volunteer or
/// any foreign id in the association list rejects the whole patch.
pub async fn apply_module_update(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    module_id: Uuid,
    patch: ModulePatch,
) -> Result<ModuleDetails, CoordinatorError> {
    let module = store
        .find_module_in_shelter(module_id, shelter_id)
        .await?
        .ok_or(CoordinatorError::ModuleNotFound(module_id))?;
    let previous = module.responsible_volunteer_id;

    if let Patch::Set(volunteer_id) = patch.responsible_volunteer_id {
        store
            .find_volunteer_in_shelter(volunteer_id, shelter_id)
            .await?
            .ok_or(CoordinatorError::VolunteerNotFound(volunteer_id))?;
    }

    let associated = match patch.associated_volunteer_ids {
        Some(ids) => Some(validate_volunteers(store, shelter_id, ids).await?),
        None => None,
    };

    let changes = ModuleChanges {
        active: patch.active,
        responsible_volunteer_id: patch.responsible_volunteer_id.into_change(),
    };
    if !changes.is_empty() {
        store.update_module(module.id, changes).await?;
    }

    if let (Patch::Cleared, Some(previous)) = (patch.responsible_volunteer_id, previous) {
        release_volunteers_module_association(store, shelter_id, previous).await?;
    }

    if let Some(ids) = associated {
        store.replace_module_volunteers(module.id, &ids).await?;
        debug!(module_id = %module.id, count = ids.len(), "Replaced associated volunteers");
    }

    if let Patch::Set(volunteer_id) = patch.responsible_volunteer_id {
        ensure_volunteers_module_association(store, shelter_id, volunteer_id).await?;
    }

    load_module(store, shelter_id, module.id).await
}

/// Flips the module's active flag
pub async fn toggle_module_active(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    module_id: Uuid,
) -> Result<ModuleDetails, CoordinatorError> {
    let module = store
        .find_module_in_shelter(module_id, shelter_id)
        .await?
        .ok_or(CoordinatorError::ModuleNotFound(module_id))?;

    let changes = ModuleChanges {
        active: Some(!module.active),
        responsible_volunteer_id: None,
    };
    store.update_module(module.id, changes).await?;
    info!(%shelter_id, module_id = %module.id, active = !module.active, "Module activation toggled");

    load_module(store, shelter_id, module.id).await
}

/// Deduplicates the ids and checks each belongs to the shelter
async fn validate_volunteers(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, CoordinatorError> {
    let mut seen = HashSet::new();
    let unique: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Ok(unique);
    }

    let found: HashSet<Uuid> = store
        .find_volunteers_in_shelter(&unique, shelter_id)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let foreign: Vec<Uuid> = unique
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    if !foreign.is_empty() {
        return Err(CoordinatorError::ForeignVolunteers(foreign));
    }

    Ok(unique)
}

/// Makes sure the volunteer is associated with the shelter's `volunteers` module
///
/// Creates the module (active) when the shelter has none. Idempotent.
pub async fn ensure_volunteers_module_association(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    volunteer_id: Uuid,
) -> Result<(), StoreError> {
    let key = ModuleKey::Volunteers;
    let existing = store
        .find_modules_by_key(shelter_id, key.as_str())
        .await?
        .into_iter()
        .next();

    let module = match existing {
        Some(module) => module,
        None => {
            info!(%shelter_id, "Creating missing volunteers module");
            store
                .create_module(CreateShelterModule {
                    shelter_id,
                    module_key: key.as_str().to_string(),
                    active: true,
                    responsible_volunteer_id: None,
                })
                .await?
        }
    };

    let inserted = store
        .add_module_volunteers(module.id, &[volunteer_id])
        .await?;
    if inserted > 0 {
        debug!(%shelter_id, %volunteer_id, "Associated responsible volunteer with volunteers module");
    }
    Ok(())
}

/// Removes the volunteer from the `volunteers` module unless they are still
/// responsible for some module of the shelter
pub async fn release_volunteers_module_association(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    volunteer_id: Uuid,
) -> Result<(), StoreError> {
    let still_responsible = store
        .list_modules_with_responsible(shelter_id, volunteer_id)
        .await?;
    if !still_responsible.is_empty() {
        debug!(
            %shelter_id,
            %volunteer_id,
            modules = still_responsible.len(),
            "Volunteer still responsible elsewhere; keeping volunteers module access"
        );
        return Ok(());
    }

    let modules: Vec<ShelterModule> = store
        .find_modules_by_key(shelter_id, ModuleKey::Volunteers.as_str())
        .await?;
    for module in modules {
        if store.remove_module_volunteer(module.id, volunteer_id).await? {
            debug!(%shelter_id, %volunteer_id, "Released volunteers module access");
        }
    }
    Ok(())
}
