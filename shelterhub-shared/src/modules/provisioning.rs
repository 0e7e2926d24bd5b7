/// Shelter creation and volunteer enrollment
///
/// Creating a shelter sets up its full module layout and records the creator
/// as owner both on the shelter row and as an `owner` role row. Enrolling a
/// volunteer creates the volunteer record and a `volunteer` role row.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::repair::ensure_role;
use crate::models::shelter::{CreateShelter, Shelter};
use crate::models::shelter_module::{CreateShelterModule, ModuleKey, ShelterModule};
use crate::models::user_shelter::ShelterRole;
use crate::models::volunteer::{CreateVolunteer, Volunteer};
use crate::store::{StoreError, TenantStore};

#[derive(Debug, Clone, Deserialize)]
pub struct NewShelter {
    pub name: String,
}

/// A freshly created shelter with its modules
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedShelter {
    #[serde(flatten)]
    pub shelter: Shelter,
    pub modules: Vec<ShelterModule>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("Shelter not found")]
    ShelterNotFound(Uuid),

    #[error("User not found")]
    UserNotFound(Uuid),

    #[error("User is already a volunteer")]
    AlreadyVolunteer(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates a shelter owned by `owner_id` with exactly one row per module key
pub async fn create_shelter(
    store: &dyn TenantStore,
    owner_id: Uuid,
    data: NewShelter,
) -> Result<ProvisionedShelter, ProvisioningError> {
    let shelter = store
        .create_shelter(CreateShelter {
            name: data.name,
            owner_id,
        })
        .await?;

    let mut modules = Vec::with_capacity(ModuleKey::ALL.len());
    for key in ModuleKey::ALL {
        let module = store
            .create_module(CreateShelterModule::with_defaults(shelter.id, key))
            .await?;
        modules.push(module);
    }

    ensure_role(store, owner_id, shelter.id, ShelterRole::Owner).await?;

    info!(shelter_id = %shelter.id, %owner_id, "Shelter created");
    Ok(ProvisionedShelter { shelter, modules })
}

/// Registers `user_id` as a volunteer of the shelter
///
/// Adds a `volunteer` role row unless the user already holds a role there.
pub async fn enroll_volunteer(
    store: &dyn TenantStore,
    shelter_id: Uuid,
    user_id: Uuid,
) -> Result<Volunteer, ProvisioningError> {
    store
        .find_shelter(shelter_id)
        .await?
        .ok_or(ProvisioningError::ShelterNotFound(shelter_id))?;
    store
        .find_user(user_id)
        .await?
        .ok_or(ProvisioningError::UserNotFound(user_id))?;

    let volunteer = match store
        .create_volunteer(CreateVolunteer {
            user_id,
            shelter_id,
        })
        .await
    {
        Ok(volunteer) => volunteer,
        Err(StoreError::Conflict(_)) => return Err(ProvisioningError::AlreadyVolunteer(user_id)),
        Err(e) => return Err(e.into()),
    };

    ensure_role(store, user_id, shelter_id, ShelterRole::Volunteer).await?;

    info!(%shelter_id, %user_id, volunteer_id = %volunteer.id, "Volunteer enrolled");
    Ok(volunteer)
}
