/// Capability resolver tests against the in-memory store

mod common;

use common::Fixture;
use shelterhub_shared::auth::permissions::{AccessQuery, Capability, PermissionResolver};
use shelterhub_shared::models::shelter::CreateShelter;
use shelterhub_shared::models::shelter_module::{ModuleChanges, ModuleKey};
use shelterhub_shared::models::user_shelter::ShelterRole;
use shelterhub_shared::store::TenantStore;
use uuid::Uuid;

async fn make_responsible(fx: &Fixture, key: ModuleKey, volunteer_id: Uuid) {
    fx.store
        .update_module(
            fx.module(key).id,
            ModuleChanges {
                active: None,
                responsible_volunteer_id: Some(Some(volunteer_id)),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_owner_holds_every_capability() {
    let fx = Fixture::new().await;
    let resolver = PermissionResolver::new(&fx.store);
    let user = Some(fx.owner.id);
    let shelter = Some(fx.shelter.id);

    assert!(resolver.can_read_module(user, shelter).await.unwrap());
    assert!(resolver
        .can_write_in_module(user, Some("animals"), shelter)
        .await
        .unwrap());
    assert!(resolver
        .can_manage_module(user, Some(fx.module(ModuleKey::Reports).id), shelter)
        .await
        .unwrap());
    assert!(resolver.is_owner_of_shelter(fx.owner.id, fx.shelter.id).await.unwrap());
}

#[tokio::test]
async fn test_admin_role_counts_as_admin_but_not_owner() {
    let fx = Fixture::new().await;
    let admin = fx.admin("admin").await;
    let resolver = PermissionResolver::new(&fx.store);

    assert!(resolver.is_admin_in_shelter(admin.id, fx.shelter.id).await.unwrap());
    assert!(!resolver.is_owner_of_shelter(admin.id, fx.shelter.id).await.unwrap());
    assert_eq!(
        resolver
            .get_user_role_in_shelter(admin.id, fx.shelter.id)
            .await
            .unwrap(),
        Some(ShelterRole::Admin)
    );
    assert!(resolver
        .can_manage_module(Some(admin.id), Some(fx.module(ModuleKey::Animals).id), Some(fx.shelter.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_owner_column_is_enough_without_role_row() {
    let fx = Fixture::new().await;
    let owner = fx.stranger().await;
    let bare = fx
        .store
        .create_shelter(CreateShelter {
            name: "Unprovisioned".to_string(),
            owner_id: owner.id,
        })
        .await
        .unwrap();
    let resolver = PermissionResolver::new(&fx.store);

    assert!(fx.store.find_user_shelter(owner.id, bare.id).await.unwrap().is_none());
    assert!(resolver.is_admin_in_shelter(owner.id, bare.id).await.unwrap());
    assert!(resolver.is_owner_of_shelter(owner.id, bare.id).await.unwrap());
    assert!(!resolver.is_admin_in_shelter(fx.owner.id, bare.id).await.unwrap());
}

#[tokio::test]
async fn test_volunteer_can_read_but_not_write_unassociated_module() {
    let fx = Fixture::new().await;
    let (user, _) = fx.volunteer("vol").await;
    let resolver = PermissionResolver::new(&fx.store);

    assert!(resolver
        .can_read_module(Some(user.id), Some(fx.shelter.id))
        .await
        .unwrap());
    assert!(!resolver
        .can_write_in_module(Some(user.id), Some("animals"), Some(fx.shelter.id))
        .await
        .unwrap());
    assert!(!resolver.is_admin_in_shelter(user.id, fx.shelter.id).await.unwrap());
}

#[tokio::test]
async fn test_volunteer_of_other_shelter_is_denied() {
    let fx = Fixture::new().await;
    let other = fx.other_shelter().await;
    let (user, _) = fx.volunteer("vol").await;
    let resolver = PermissionResolver::new(&fx.store);

    assert!(!resolver
        .can_read_module(Some(user.id), Some(other.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_stranger_is_denied_everything() {
    let fx = Fixture::new().await;
    let stranger = fx.stranger().await;
    let resolver = PermissionResolver::new(&fx.store);
    let user = Some(stranger.id);
    let shelter = Some(fx.shelter.id);

    assert!(!resolver.can_read_module(user, shelter).await.unwrap());
    assert!(!resolver
        .can_write_in_module(user, Some("people"), shelter)
        .await
        .unwrap());
    assert!(!resolver
        .can_manage_module(user, Some(fx.module(ModuleKey::People).id), shelter)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_associated_volunteer_writes_only_in_that_module() {
    let fx = Fixture::new().await;
    let (user, volunteer) = fx.volunteer("vol").await;
    fx.store
        .add_module_volunteers(fx.module(ModuleKey::Animals).id, &[volunteer.id])
        .await
        .unwrap();
    let resolver = PermissionResolver::new(&fx.store);
    let shelter = Some(fx.shelter.id);

    assert!(resolver
        .can_write_in_module(Some(user.id), Some("animals"), shelter)
        .await
        .unwrap());
    assert!(!resolver
        .can_write_in_module(Some(user.id), Some("resources"), shelter)
        .await
        .unwrap());
    // association alone does not grant management
    assert!(!resolver
        .can_manage_module(Some(user.id), Some(fx.module(ModuleKey::Animals).id), shelter)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_responsible_volunteer_writes_and_manages_module() {
    let fx = Fixture::new().await;
    let (user, volunteer) = fx.volunteer("lead").await;
    make_responsible(&fx, ModuleKey::Resources, volunteer.id).await;
    let resolver = PermissionResolver::new(&fx.store);
    let shelter = Some(fx.shelter.id);

    assert!(resolver
        .can_write_in_module(Some(user.id), Some("resources"), shelter)
        .await
        .unwrap());
    assert!(resolver
        .can_manage_module(Some(user.id), Some(fx.module(ModuleKey::Resources).id), shelter)
        .await
        .unwrap());
    assert!(!resolver
        .can_manage_module(Some(user.id), Some(fx.module(ModuleKey::Animals).id), shelter)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_manage_rejects_module_of_other_shelter() {
    let fx = Fixture::new().await;
    let other = fx.other_shelter().await;
    let (user, volunteer) = fx.volunteer("lead").await;
    make_responsible(&fx, ModuleKey::Animals, volunteer.id).await;
    let resolver = PermissionResolver::new(&fx.store);

    // right module, wrong shelter in the request
    assert!(!resolver
        .can_manage_module(Some(user.id), Some(fx.module(ModuleKey::Animals).id), Some(other.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_missing_inputs_deny() {
    let fx = Fixture::new().await;
    let resolver = PermissionResolver::new(&fx.store);
    let shelter = Some(fx.shelter.id);

    assert!(!resolver.can_read_module(None, shelter).await.unwrap());
    assert!(!resolver.can_read_module(Some(fx.owner.id), None).await.unwrap());
    assert!(!resolver
        .can_write_in_module(Some(fx.owner.id), None, shelter)
        .await
        .unwrap());
    assert!(!resolver
        .can_write_in_module(Some(fx.owner.id), Some(""), shelter)
        .await
        .unwrap());
    assert!(!resolver
        .can_manage_module(Some(fx.owner.id), None, shelter)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unknown_module_key_denies_non_admin() {
    let fx = Fixture::new().await;
    let (user, volunteer) = fx.volunteer("vol").await;
    make_responsible(&fx, ModuleKey::Animals, volunteer.id).await;
    let resolver = PermissionResolver::new(&fx.store);

    let query = AccessQuery::new(Some(user.id), Some(fx.shelter.id)).with_module_key(Some("pets"));
    assert!(!resolver.check(Capability::Write, &query).await.unwrap());
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let fx = Fixture::new().await;
    fx.store.set_failing(true);
    let resolver = PermissionResolver::new(&fx.store);

    let result = resolver
        .can_read_module(Some(fx.owner.id), Some(fx.shelter.id))
        .await;
    assert!(result.is_err());
}
