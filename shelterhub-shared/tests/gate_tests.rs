/// Authorization gate and tenant-id extraction against the in-memory store

mod common;

use common::Fixture;
use serde_json::json;
use shelterhub_shared::auth::extractor::{extract_params, RequestView};
use shelterhub_shared::auth::gate::{authorize, require_shelter_admin, AuthzError, Grant, RouteRequirement};
use shelterhub_shared::auth::metrics::GateMetrics;
use shelterhub_shared::auth::middleware::AuthContext;
use shelterhub_shared::auth::permissions::Capability;
use shelterhub_shared::models::record::{NewRecord, RecordFamily};
use shelterhub_shared::models::shelter_module::{ModuleChanges, ModuleKey};
use shelterhub_shared::modules::provisioning::enroll_volunteer;
use shelterhub_shared::store::TenantStore;
use uuid::Uuid;

async fn create_animal(fx: &Fixture) -> Uuid {
    fx.store
        .create_record(
            RecordFamily::Animals,
            NewRecord {
                shelter_id: fx.shelter.id,
                name: "Biscuit".to_string(),
                details: json!({ "species": "dog" }),
            },
        )
        .await
        .unwrap()
        .id
}

fn shelter_view(path: &str, shelter_id: Uuid) -> RequestView {
    RequestView::new(path).with_path_param("shelterId", shelter_id.to_string())
}

#[tokio::test]
async fn test_no_requirement_allows_anonymous() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();

    let grant = authorize(
        &fx.store,
        None,
        RouteRequirement::none(),
        &RequestView::new("/health"),
        &metrics,
    )
    .await
    .unwrap();

    assert_eq!(grant, Grant::NoRequirement);
    assert!(grant.params().is_none());
    assert_eq!(metrics.snapshot().allowed, 0);
}

#[tokio::test]
async fn test_missing_principal_is_unauthenticated() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let view = shelter_view("/v1/shelters/x/modules", fx.shelter.id);

    let err = authorize(&fx.store, None, RouteRequirement::read(), &view, &metrics)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::Unauthenticated));
    assert_eq!(metrics.snapshot().rejected, 1);
}

#[tokio::test]
async fn test_missing_shelter_id_is_rejected() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let principal = AuthContext::new(fx.owner.id);

    let err = authorize(
        &fx.store,
        Some(&principal),
        RouteRequirement::read(),
        &RequestView::new("/v1/modules"),
        &metrics,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AuthzError::ShelterIdRequired));
}

#[tokio::test]
async fn test_owner_takes_admin_shortcut_without_module_identifiers() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let principal = AuthContext::new(fx.owner.id);
    let view = shelter_view("/v1/shelters/x/modules/y", fx.shelter.id);

    // MANAGE without a module id would be 400 for anyone else
    let grant = authorize(&fx.store, Some(&principal), RouteRequirement::manage(), &view, &metrics)
        .await
        .unwrap();

    match grant {
        Grant::ShelterAdmin(params) => assert_eq!(params.shelter_id, Some(fx.shelter.id)),
        other => panic!("expected admin grant, got {:?}", other),
    }
    assert_eq!(metrics.snapshot().allowed, 1);
}

#[tokio::test]
async fn test_read_allowed_once_user_becomes_volunteer() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let user = fx.stranger().await;
    let principal = AuthContext::new(user.id);
    let view = shelter_view("/v1/shelters/x/modules", fx.shelter.id);

    let err = authorize(&fx.store, Some(&principal), RouteRequirement::read(), &view, &metrics)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::ReadDenied));

    enroll_volunteer(&fx.store, fx.shelter.id, user.id).await.unwrap();

    let grant = authorize(&fx.store, Some(&principal), RouteRequirement::read(), &view, &metrics)
        .await
        .unwrap();
    assert!(matches!(grant, Grant::Capability(Capability::Read, _)));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.denied, 1);
    assert_eq!(snapshot.allowed, 1);
}

#[tokio::test]
async fn test_volunteer_read_allowed_stranger_denied() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let (user, _) = fx.volunteer("vol").await;
    let stranger = fx.stranger().await;
    let view = shelter_view("/v1/shelters/x/modules", fx.shelter.id);

    let grant = authorize(
        &fx.store,
        Some(&AuthContext::new(user.id)),
        RouteRequirement::read(),
        &view,
        &metrics,
    )
    .await
    .unwrap();
    assert!(matches!(grant, Grant::Capability(Capability::Read, _)));

    let err = authorize(
        &fx.store,
        Some(&AuthContext::new(stranger.id)),
        RouteRequirement::read(),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthzError::ReadDenied));
    assert_eq!(err.code(), "read_denied");

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.allowed, 1);
    assert_eq!(snapshot.denied, 1);
}

#[tokio::test]
async fn test_write_requires_module_key_for_non_admin() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let (user, _) = fx.volunteer("vol").await;
    let view = shelter_view("/v1/records", fx.shelter.id);

    let err = authorize(
        &fx.store,
        Some(&AuthContext::new(user.id)),
        RouteRequirement::write(),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AuthzError::ModuleKeyRequired));
}

#[tokio::test]
async fn test_write_uses_declared_module_key() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let (user, volunteer) = fx.volunteer("vol").await;
    fx.store
        .add_module_volunteers(fx.module(ModuleKey::Animals).id, &[volunteer.id])
        .await
        .unwrap();
    let principal = AuthContext::new(user.id);

    // the request claims another module; the route binding wins
    let view = RequestView::new("/v1/animals")
        .with_content_type("application/json")
        .with_json_body(json!({
            "shelterId": fx.shelter.id.to_string(),
            "moduleKey": "resources",
        }));

    let grant = authorize(
        &fx.store,
        Some(&principal),
        RouteRequirement::write().in_module(ModuleKey::Animals),
        &view,
        &metrics,
    )
    .await
    .unwrap();
    assert_eq!(
        grant.params().and_then(|p| p.module_key.as_deref()),
        Some("animals")
    );

    let err = authorize(
        &fx.store,
        Some(&principal),
        RouteRequirement::write().in_module(ModuleKey::Resources),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthzError::WriteDenied));
}

#[tokio::test]
async fn test_manage_requires_module_id_and_responsibility() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let (user, volunteer) = fx.volunteer("lead").await;
    let module = fx.module(ModuleKey::Animals).clone();
    fx.store
        .update_module(
            module.id,
            ModuleChanges {
                active: None,
                responsible_volunteer_id: Some(Some(volunteer.id)),
            },
        )
        .await
        .unwrap();
    let principal = AuthContext::new(user.id);

    let err = authorize(
        &fx.store,
        Some(&principal),
        RouteRequirement::manage(),
        &shelter_view("/v1/shelters/x/modules", fx.shelter.id),
        &metrics,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthzError::ModuleIdRequired));

    let view = shelter_view("/v1/shelters/x/modules/y", fx.shelter.id)
        .with_path_param("moduleId", module.id.to_string());
    let grant = authorize(&fx.store, Some(&principal), RouteRequirement::manage(), &view, &metrics)
        .await
        .unwrap();
    assert!(matches!(grant, Grant::Capability(Capability::Manage, _)));

    let other = fx.module(ModuleKey::Reports).id;
    let view = shelter_view("/v1/shelters/x/modules/y", fx.shelter.id)
        .with_path_param("moduleId", other.to_string());
    let err = authorize(&fx.store, Some(&principal), RouteRequirement::manage(), &view, &metrics)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::ManageDenied));
}

#[tokio::test]
async fn test_reverse_lookup_resolves_shelter_from_record_id() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let animal_id = create_animal(&fx).await;
    let view = RequestView::new(format!("/v1/animals/{}", animal_id))
        .with_path_param("id", animal_id.to_string());

    let params = extract_params(&fx.store, &view, Some(ModuleKey::Animals), &metrics).await;

    assert_eq!(params.shelter_id, Some(fx.shelter.id));
    assert_eq!(params.module_key.as_deref(), Some("animals"));
    assert_eq!(metrics.snapshot().reverse_lookup_failures, 0);
}

#[tokio::test]
async fn test_reverse_lookup_resolves_volunteer_shelter() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let (_, volunteer) = fx.volunteer("vol").await;
    let view = RequestView::new(format!("/v1/volunteers/{}", volunteer.id))
        .with_path_param("id", volunteer.id.to_string());

    let params = extract_params(&fx.store, &view, None, &metrics).await;

    assert_eq!(params.shelter_id, Some(fx.shelter.id));
}

#[tokio::test]
async fn test_reverse_lookup_ignores_unclassified_paths() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let animal_id = create_animal(&fx).await;
    let view = RequestView::new(format!("/v1/reports/{}", animal_id))
        .with_path_param("id", animal_id.to_string());

    let params = extract_params(&fx.store, &view, None, &metrics).await;

    assert_eq!(params.shelter_id, None);
}

#[tokio::test]
async fn test_reverse_lookup_of_unknown_record_is_absent() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let missing = Uuid::new_v4();
    let view = RequestView::new(format!("/v1/resources/{}", missing))
        .with_path_param("id", missing.to_string());

    let err = authorize(
        &fx.store,
        Some(&AuthContext::new(fx.owner.id)),
        RouteRequirement::read().in_module(ModuleKey::Resources),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AuthzError::ShelterIdRequired));
    assert_eq!(metrics.snapshot().reverse_lookup_failures, 0);
}

#[tokio::test]
async fn test_reverse_lookup_failure_is_counted_not_raised() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let animal_id = create_animal(&fx).await;
    let view = RequestView::new(format!("/v1/animals/{}", animal_id))
        .with_path_param("id", animal_id.to_string());

    fx.store.set_failing(true);
    let params = extract_params(&fx.store, &view, None, &metrics).await;

    assert_eq!(params.shelter_id, None);
    assert_eq!(metrics.snapshot().reverse_lookup_failures, 1);
}

#[tokio::test]
async fn test_direct_shelter_id_skips_reverse_lookup() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let animal_id = create_animal(&fx).await;
    let view = RequestView::new(format!("/v1/animals/{}", animal_id))
        .with_path_param("id", animal_id.to_string())
        .with_query_param("shelterId", fx.shelter.id.to_string());

    // a failing store would be counted if the lookup ran
    fx.store.set_failing(true);
    let params = extract_params(&fx.store, &view, None, &metrics).await;

    assert_eq!(params.shelter_id, Some(fx.shelter.id));
    assert_eq!(metrics.snapshot().reverse_lookup_failures, 0);
}

#[tokio::test]
async fn test_store_error_during_decision_is_surfaced() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let view = shelter_view("/v1/shelters/x/modules", fx.shelter.id);

    fx.store.set_failing(true);
    let err = authorize(
        &fx.store,
        Some(&AuthContext::new(fx.owner.id)),
        RouteRequirement::read(),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AuthzError::Store(_)));
    assert_eq!(err.code(), "internal_error");
}

#[tokio::test]
async fn test_require_shelter_admin() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let admin = fx.admin("admin").await;
    let (volunteer_user, _) = fx.volunteer("vol").await;
    let view = shelter_view("/v1/shelters/x/modules/y/toggle", fx.shelter.id);

    require_shelter_admin(&fx.store, Some(&AuthContext::new(fx.owner.id)), &view, &metrics)
        .await
        .unwrap();
    require_shelter_admin(&fx.store, Some(&AuthContext::new(admin.id)), &view, &metrics)
        .await
        .unwrap();

    let err = require_shelter_admin(
        &fx.store,
        Some(&AuthContext::new(volunteer_user.id)),
        &view,
        &metrics,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AuthzError::ShelterAdminOnly));

    let err = require_shelter_admin(&fx.store, None, &view, &metrics)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::Unauthenticated));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.allowed, 2);
    assert_eq!(snapshot.denied, 1);
    assert_eq!(snapshot.rejected, 1);
}

#[tokio::test]
async fn test_require_shelter_admin_does_not_reverse_lookup() {
    let fx = Fixture::new().await;
    let metrics = GateMetrics::new();
    let animal_id = create_animal(&fx).await;
    let view = RequestView::new(format!("/v1/animals/{}", animal_id))
        .with_path_param("id", animal_id.to_string());

    let err = require_shelter_admin(&fx.store, Some(&AuthContext::new(fx.owner.id)), &view, &metrics)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthzError::ShelterIdRequired));
}
