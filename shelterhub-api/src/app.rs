/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use shelterhub_api::{app::{build_router, AppState}, config::Config};
/// use shelterhub_shared::store::InMemoryTenantStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(InMemoryTenantStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::middleware::authorization::{guard, GuardState};
use crate::middleware::security::SecurityHeadersLayer;
use crate::routes::{self, policy::Operation};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, MethodRouter},
    Extension, Router,
};
use shelterhub_shared::auth::metrics::GateMetrics;
use shelterhub_shared::auth::middleware::create_jwt_middleware;
use shelterhub_shared::models::record::RecordFamily;
use shelterhub_shared::store::TenantStore;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TenantStore>,
    pub config: Arc<Config>,
    /// Authorization gate counters, reported by `/health`
    pub metrics: Arc<GateMetrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn TenantStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            metrics: Arc::new(GateMetrics::new()),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Mounts `route` behind the authorization gate for `operation`
fn guarded(
    state: &AppState,
    operation: Operation,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(axum::middleware::from_fn_with_state(
        GuardState::new(state, operation),
        guard,
    ))
}

fn record_routes(state: &AppState, family: RecordFamily) -> Router<AppState> {
    let create = match family {
        RecordFamily::Animals => post(routes::records::create_animal),
        RecordFamily::Resources | RecordFamily::ShelteredPeople => {
            post(routes::records::create_record)
        }
    };

    Router::new()
        .route(
            "/",
            guarded(state, Operation::ListRecords(family), get(routes::records::list_records)),
        )
        .route("/", guarded(state, Operation::CreateRecord(family), create))
        .route(
            "/:id",
            guarded(state, Operation::GetRecord(family), get(routes::records::get_record)),
        )
        .route(
            "/:id",
            guarded(
                state,
                Operation::DeleteRecord(family),
                delete(routes::records::delete_record),
            ),
        )
        .layer(Extension(family))
}

/// Builds the complete router
///
/// ```text
/// /health                                          public
/// /v1/                                             Bearer JWT
/// ├── POST  /shelters
/// ├── GET   /shelters/:shelterId/role
/// ├── GET   /shelters/:shelterId/modules
/// ├── GET   /shelters/:shelterId/modules/:id
/// ├── PATCH /shelters/:shelterId/modules/:id
/// ├── PATCH /shelters/:shelterId/modules/:id/toggle
/// ├── POST  /shelters/:shelterId/volunteers
/// ├── GET   /volunteers/:id
/// └── /animals, /resources, /sheltered-people      see routes::records
/// ```
///
/// Guarded routes take their rule from [`Operation::access`].
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, tracing, body limit, then on
/// `/v1` JWT authentication, then per route the authorization gate.
pub fn build_router(state: AppState) -> Router {
    use routes::{health, modules, shelters, volunteers};

    let shelter_routes = Router::new()
        .route("/", post(shelters::create_shelter))
        .route("/:shelterId/role", get(shelters::get_role))
        .route(
            "/:shelterId/modules",
            guarded(&state, Operation::ListModules, get(modules::list_modules)),
        )
        .route(
            "/:shelterId/modules/:id",
            guarded(&state, Operation::GetModule, get(modules::get_module)),
        )
        .route(
            "/:shelterId/modules/:id",
            guarded(&state, Operation::UpdateModule, patch(modules::update_module)),
        )
        .route(
            "/:shelterId/modules/:id/toggle",
            guarded(&state, Operation::ToggleModule, patch(modules::toggle_module)),
        )
        .route(
            "/:shelterId/volunteers",
            guarded(&state, Operation::EnrollVolunteer, post(volunteers::enroll_volunteer)),
        );

    let v1_routes = Router::new()
        .nest("/shelters", shelter_routes)
        .route(
            "/volunteers/:id",
            guarded(&state, Operation::GetVolunteer, get(volunteers::get_volunteer)),
        )
        .nest("/animals", record_routes(&state, RecordFamily::Animals))
        .nest("/resources", record_routes(&state, RecordFamily::Resources))
        .nest(
            "/sheltered-people",
            record_routes(&state, RecordFamily::ShelteredPeople),
        )
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1", v1_routes)
        .layer(DefaultBodyLimit::max(state.config.api.body_limit_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
