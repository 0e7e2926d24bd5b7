//! # ShelterHub Admin Library
//!
//! Operator maintenance for the shelter permission data.
//!
//! ## Modules
//!
//! - `cli`: Command-line arguments
//! - `commands`: Store-level maintenance commands and their reports
//!
//! ## Example
//!
//! ```no_run
//! use shelterhub_admin::cli::Command;
//! use shelterhub_admin::commands::run_store_command;
//! use shelterhub_shared::store::InMemoryTenantStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = InMemoryTenantStore::new();
//! let report = run_store_command(&store, &Command::Repair { dry_run: true }).await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
