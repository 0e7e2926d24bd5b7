/// Administrative data repair
///
/// Two procedures reconcile drifted data with the current model. Both are
/// run by operators through `shelterhub-admin`, never on the request path.
///
/// # Module keys
///
/// [`repair_module_keys`] walks every shelter:
///
/// 1. Rows with the legacy key `shelteredPeople` are renamed to `people`,
///    unless the shelter already has a `people` row (then they are flagged)
/// 2. Rows with any other unrecognized key are flagged for a manual
///    decision; nothing is ever deleted
/// 3. Extra rows for an already present valid key are flagged as duplicates
/// 4. Every valid key still missing is created with the default activation
///    (people, resources, volunteers active; animals, reports inactive)
///
/// Existing rows keep their `active` flag. With `dry_run` the report lists
/// what would happen and nothing is written.
///
/// # Shelter roles
///
/// [`backfill_user_shelter_roles`] gives every shelter owner an `owner` role
/// row and every volunteer a `volunteer` role row when the pair has none.
/// Existing rows are left as they are.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::shelter_module::{CreateShelterModule, ModuleKey, LEGACY_PEOPLE_KEY};
use crate::models::user_shelter::{CreateUserShelter, ShelterRole};
use crate::store::{StoreError, TenantStore};

/// Why a row needs an operator decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Key is neither valid nor the known legacy key
    UnknownKey,

    /// Legacy row in a shelter that already has a `people` row
    LegacyKeyConflict,

    /// Second row for a valid key
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedModule {
    pub shelter_id: Uuid,
    pub module_id: Uuid,
    pub module_key: String,
    pub reason: FlagReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedModule {
    pub shelter_id: Uuid,
    pub module_id: Uuid,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedModule {
    pub shelter_id: Uuid,
    pub module_key: ModuleKey,
    pub active: bool,
}

/// Outcome of [`repair_module_keys`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub dry_run: bool,
    pub shelters_checked: usize,
    pub renamed: Vec<RenamedModule>,
    pub created: Vec<CreatedModule>,
    pub flagged: Vec<FlaggedModule>,
}

impl RepairReport {
    /// True when the data already matched the model
    pub fn is_clean(&self) -> bool {
        self.renamed.is_empty() && self.created.is_empty() && self.flagged.is_empty()
    }
}

/// Reconciles module rows of every shelter with the valid key set
pub async fn repair_module_keys(
    store: &dyn TenantStore,
    dry_run: bool,
) -> Result<RepairReport, StoreError> {
    let mut report = RepairReport {
        dry_run,
        ..Default::default()
    };

    for shelter in store.list_shelters().await? {
        report.shelters_checked += 1;
        let modules = store.list_modules(shelter.id).await?;

        let mut present: HashSet<ModuleKey> = HashSet::new();
        let mut legacy = Vec::new();

        for module in &modules {
            match module.key() {
                Some(key) => {
                    if !present.insert(key) {
                        report.flagged.push(FlaggedModule {
                            shelter_id: shelter.id,
                            module_id: module.id,
                            module_key: module.module_key.clone(),
                            reason: FlagReason::Duplicate,
                        });
                    }
                }
                None if module.module_key == LEGACY_PEOPLE_KEY => legacy.push(module),
                None => report.flagged.push(FlaggedModule {
                    shelter_id: shelter.id,
                    module_id: module.id,
                    module_key: module.module_key.clone(),
                    reason: FlagReason::UnknownKey,
                }),
            }
        }

        for module in legacy {
            if present.insert(ModuleKey::People) {
                if !dry_run {
                    store
                        .rename_module_key(module.id, ModuleKey::People.as_str())
                        .await?;
                }
                info!(shelter_id = %shelter.id, module_id = %module.id, dry_run, "Renamed legacy module key");
                report.renamed.push(RenamedModule {
                    shelter_id: shelter.id,
                    module_id: module.id,
                    from: module.module_key.clone(),
                    to: ModuleKey::People.as_str().to_string(),
                });
            } else {
                report.flagged.push(FlaggedModule {
                    shelter_id: shelter.id,
                    module_id: module.id,
                    module_key: module.module_key.clone(),
                    reason: FlagReason::LegacyKeyConflict,
                });
            }
        }

        for key in ModuleKey::ALL {
            if present.contains(&key) {
                continue;
            }
            if !dry_run {
                store
                    .create_module(CreateShelterModule::with_defaults(shelter.id, key))
                    .await?;
            }
            info!(shelter_id = %shelter.id, module_key = %key, dry_run, "Created missing module");
            report.created.push(CreatedModule {
                shelter_id: shelter.id,
                module_key: key,
                active: key.default_active(),
            });
        }
    }

    for flagged in &report.flagged {
        warn!(
            shelter_id = %flagged.shelter_id,
            module_id = %flagged.module_id,
            module_key = %flagged.module_key,
            reason = ?flagged.reason,
            "Module row needs a manual decision"
        );
    }

    Ok(report)
}

/// Outcome of [`backfill_user_shelter_roles`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub owner_roles_created: usize,
    pub volunteer_roles_created: usize,
    pub already_present: usize,
}

/// Creates missing owner and volunteer role rows
pub async fn backfill_user_shelter_roles(
    store: &dyn TenantStore,
) -> Result<BackfillReport, StoreError> {
    let mut report = BackfillReport::default();

    for shelter in store.list_shelters().await? {
        if ensure_role(store, shelter.owner_id, shelter.id, ShelterRole::Owner).await? {
            report.owner_roles_created += 1;
        } else {
            report.already_present += 1;
        }
    }

    for volunteer in store.list_volunteers().await? {
        if ensure_role(
            store,
            volunteer.user_id,
            volunteer.shelter_id,
            ShelterRole::Volunteer,
        )
        .await?
        {
            report.volunteer_roles_created += 1;
        } else {
            report.already_present += 1;
        }
    }

    info!(
        owners = report.owner_roles_created,
        volunteers = report.volunteer_roles_created,
        untouched = report.already_present,
        "Shelter role backfill finished"
    );
    Ok(report)
}

/// Creates the role row if the pair has none; returns true if created
pub(crate) async fn ensure_role(
    store: &dyn TenantStore,
    user_id: Uuid,
    shelter_id: Uuid,
    role: ShelterRole,
) -> Result<bool, StoreError> {
    if store.find_user_shelter(user_id, shelter_id).await?.is_some() {
        return Ok(false);
    }

    match store
        .create_user_shelter(CreateUserShelter {
            user_id,
            shelter_id,
            role,
        })
        .await
    {
        Ok(_) => Ok(true),
        // created concurrently
        Err(StoreError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
