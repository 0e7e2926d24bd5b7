//! # ShelterHub Admin
//!
//! Operator commands for the shelter database: schema migrations, module
//! key repair and role backfill. Every command prints a JSON report on
//! stdout; logs go to stderr.
//!
//! Exits with status 2 when the report lists rows that need a manual
//! decision.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p shelterhub-admin -- repair --dry-run
//! ```

use clap::Parser;
use shelterhub_admin::cli::{Cli, Command};
use shelterhub_admin::commands::{run_store_command, Report};
use shelterhub_shared::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
use shelterhub_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use shelterhub_shared::store::PgTenantStore;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelterhub_admin=info,shelterhub_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::info!(
        command = ?cli.command,
        "ShelterHub Admin v{}",
        env!("CARGO_PKG_VERSION")
    );

    if cli.command == Command::Migrate {
        ensure_database_exists(&cli.database_url).await?;
    }

    let pool = create_pool(DatabaseConfig {
        url: cli.database_url.clone(),
        max_connections: 2,
        min_connections: 1,
        ..Default::default()
    })
    .await?;

    let report = match &cli.command {
        Command::Migrate => {
            run_migrations(&pool).await?;
            Report::Migrate(get_migration_status(&pool).await?)
        }
        command => {
            let store = PgTenantStore::new(pool.clone());
            run_store_command(&store, command).await?
        }
    };

    close_pool(pool).await;

    println!("{}", report.to_json(cli.compact)?);

    if report.needs_attention() {
        tracing::warn!("Report lists rows that need a manual decision");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
