/// Module-key repair and role backfill

mod common;

use common::create_user;
use shelterhub_shared::models::shelter::{CreateShelter, Shelter};
use shelterhub_shared::models::shelter_module::{CreateShelterModule, ModuleKey};
use shelterhub_shared::models::user_shelter::ShelterRole;
use shelterhub_shared::models::volunteer::CreateVolunteer;
use shelterhub_shared::modules::repair::{
    backfill_user_shelter_roles, repair_module_keys, FlagReason,
};
use shelterhub_shared::store::{InMemoryTenantStore, TenantStore};

/// A shelter created straight through the store, with no modules or roles
async fn bare_shelter(store: &InMemoryTenantStore) -> Shelter {
    let owner = create_user(store, "owner").await;
    store
        .create_shelter(CreateShelter {
            name: "Legacy Shelter".to_string(),
            owner_id: owner.id,
        })
        .await
        .unwrap()
}

async fn add_module(store: &InMemoryTenantStore, shelter: &Shelter, key: &str, active: bool) {
    store
        .create_module(CreateShelterModule {
            shelter_id: shelter.id,
            module_key: key.to_string(),
            active,
            responsible_volunteer_id: None,
        })
        .await
        .unwrap();
}

async fn keys_of(store: &InMemoryTenantStore, shelter: &Shelter) -> Vec<String> {
    let mut keys: Vec<String> = store
        .list_modules(shelter.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.module_key)
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_missing_modules_created_with_default_activation() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;

    let report = repair_module_keys(&store, false).await.unwrap();

    assert_eq!(report.shelters_checked, 1);
    assert_eq!(report.created.len(), 5);
    let modules = store.list_modules(shelter.id).await.unwrap();
    for module in modules {
        let key = module.key().expect("valid key");
        assert_eq!(module.active, key.default_active(), "{}", key);
    }
    let reports = store
        .find_modules_by_key(shelter.id, ModuleKey::Reports.as_str())
        .await
        .unwrap();
    assert!(!reports[0].active);
}

#[tokio::test]
async fn test_legacy_key_renamed_keeping_active_flag() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    add_module(&store, &shelter, "shelteredPeople", false).await;

    let report = repair_module_keys(&store, false).await.unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.renamed[0].from, "shelteredPeople");
    assert_eq!(report.renamed[0].to, "people");
    assert!(report.created.iter().all(|c| c.module_key != ModuleKey::People));

    let people = store
        .find_modules_by_key(shelter.id, "people")
        .await
        .unwrap();
    assert_eq!(people.len(), 1);
    assert!(!people[0].active);
}

#[tokio::test]
async fn test_legacy_key_conflict_and_unknown_keys_are_flagged() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    add_module(&store, &shelter, "people", true).await;
    add_module(&store, &shelter, "shelteredPeople", true).await;
    add_module(&store, &shelter, "kennels", true).await;
    add_module(&store, &shelter, "animals", false).await;
    add_module(&store, &shelter, "animals", true).await;

    let report = repair_module_keys(&store, false).await.unwrap();

    let mut reasons: Vec<(String, FlagReason)> = report
        .flagged
        .iter()
        .map(|f| (f.module_key.clone(), f.reason))
        .collect();
    reasons.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        reasons,
        vec![
            ("animals".to_string(), FlagReason::Duplicate),
            ("kennels".to_string(), FlagReason::UnknownKey),
            ("shelteredPeople".to_string(), FlagReason::LegacyKeyConflict),
        ]
    );
    assert!(report.renamed.is_empty());

    // flagged rows are kept
    let keys = keys_of(&store, &shelter).await;
    assert!(keys.contains(&"kennels".to_string()));
    assert!(keys.contains(&"shelteredPeople".to_string()));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    add_module(&store, &shelter, "shelteredPeople", true).await;

    let report = repair_module_keys(&store, true).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.created.len(), 4);
    assert_eq!(keys_of(&store, &shelter).await, vec!["shelteredPeople".to_string()]);
}

#[tokio::test]
async fn test_second_run_is_clean() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    add_module(&store, &shelter, "shelteredPeople", true).await;

    repair_module_keys(&store, false).await.unwrap();
    let report = repair_module_keys(&store, false).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(keys_of(&store, &shelter).await.len(), 5);
}

#[tokio::test]
async fn test_backfill_creates_missing_roles_once() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    let user = create_user(&store, "vol").await;
    store
        .create_volunteer(CreateVolunteer {
            user_id: user.id,
            shelter_id: shelter.id,
        })
        .await
        .unwrap();

    let report = backfill_user_shelter_roles(&store).await.unwrap();
    assert_eq!(report.owner_roles_created, 1);
    assert_eq!(report.volunteer_roles_created, 1);
    assert_eq!(report.already_present, 0);

    let owner_role = store
        .find_user_shelter(shelter.owner_id, shelter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner_role.role, ShelterRole::Owner);
    let volunteer_role = store
        .find_user_shelter(user.id, shelter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(volunteer_role.role, ShelterRole::Volunteer);

    let again = backfill_user_shelter_roles(&store).await.unwrap();
    assert_eq!(again.owner_roles_created, 0);
    assert_eq!(again.volunteer_roles_created, 0);
    assert_eq!(again.already_present, 2);
}

#[tokio::test]
async fn test_backfill_keeps_existing_admin_role() {
    let store = InMemoryTenantStore::new();
    let shelter = bare_shelter(&store).await;
    let user = create_user(&store, "vol").await;
    store
        .create_user_shelter(shelterhub_shared::models::user_shelter::CreateUserShelter {
            user_id: user.id,
            shelter_id: shelter.id,
            role: ShelterRole::Admin,
        })
        .await
        .unwrap();
    store
        .create_volunteer(CreateVolunteer {
            user_id: user.id,
            shelter_id: shelter.id,
        })
        .await
        .unwrap();

    backfill_user_shelter_roles(&store).await.unwrap();

    let role = store
        .find_user_shelter(user.id, shelter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role.role, ShelterRole::Admin);
}
