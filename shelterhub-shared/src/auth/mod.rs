/// Authentication and module-scoped authorization
///
/// # Modules
///
/// - [`jwt`]: Bearer token validation
/// - [`middleware`]: Axum middleware attaching the authenticated principal
/// - [`permissions`]: Capability resolution (READ / WRITE / MANAGE)
/// - [`extractor`]: Shelter id, module key and module id extraction
/// - [`gate`]: Per-route authorization decision
/// - [`metrics`]: Gate counters
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::auth::extractor::RequestView;
/// use shelterhub_shared::auth::gate::{authorize, RouteRequirement};
/// use shelterhub_shared::auth::metrics::GateMetrics;
/// use shelterhub_shared::auth::middleware::AuthContext;
/// use shelterhub_shared::store::InMemoryTenantStore;
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, shelter_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTenantStore::new();
/// let metrics = GateMetrics::new();
/// let view = RequestView::new("/v1/animals").with_query_param("shelterId", shelter_id.to_string());
///
/// let grant = authorize(
///     &store,
///     Some(&AuthContext::new(user_id)),
///     RouteRequirement::read(),
///     &view,
///     &metrics,
/// ).await?;
/// # Ok(())
/// # }
/// ```

pub mod extractor;
pub mod gate;
pub mod jwt;
pub mod metrics;
pub mod middleware;
pub mod permissions;
