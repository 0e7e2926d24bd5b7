//! # ShelterHub API Server
//!
//! Serves the shelter management API: shelters, modules, volunteers and
//! shelter records, each route guarded by the module-scoped authorization
//! gate.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p shelterhub-api
//! ```

use shelterhub_api::app::{build_router, AppState};
use shelterhub_api::config::Config;
use shelterhub_shared::db::{migrations::run_migrations, pool};
use shelterhub_shared::store::PgTenantStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelterhub_api=debug,shelterhub_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "ShelterHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&db).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgTenantStore::new(db.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
