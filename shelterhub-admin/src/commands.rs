/// Maintenance commands and their reports
///
/// Store-level commands run against any [`TenantStore`]; `migrate` needs a
/// raw pool and is executed by the binary directly.

use anyhow::{bail, Context};
use serde::Serialize;
use shelterhub_shared::db::migrations::MigrationStatus;
use shelterhub_shared::modules::repair::{
    backfill_user_shelter_roles, repair_module_keys, BackfillReport, RepairReport,
};
use shelterhub_shared::store::TenantStore;
use tracing::{info, warn};

use crate::cli::Command;

/// JSON report printed by every command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Report {
    Repair(RepairReport),
    BackfillRoles(BackfillReport),
    Migrate(MigrationStatus),
}

impl Report {
    /// Rows an operator still has to decide on by hand
    pub fn needs_attention(&self) -> bool {
        match self {
            Report::Repair(report) => !report.flagged.is_empty(),
            Report::BackfillRoles(_) => false,
            Report::Migrate(status) => !status.is_up_to_date,
        }
    }

    pub fn to_json(&self, compact: bool) -> anyhow::Result<String> {
        let json = if compact {
            serde_json::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        Ok(json)
    }
}

/// Runs `repair` or `backfill-roles`
pub async fn run_store_command(store: &dyn TenantStore, command: &Command) -> anyhow::Result<Report> {
    match command {
        Command::Repair { dry_run } => {
            let report = repair_module_keys(store, *dry_run)
                .await
                .context("module key repair failed")?;
            info!(
                dry_run,
                shelters = report.shelters_checked,
                renamed = report.renamed.len(),
                created = report.created.len(),
                flagged = report.flagged.len(),
                "Module key repair finished"
            );
            Ok(Report::Repair(report))
        }
        Command::BackfillRoles => {
            let report = backfill_user_shelter_roles(store)
                .await
                .context("role backfill failed")?;
            Ok(Report::BackfillRoles(report))
        }
        Command::Migrate => {
            warn!("migrate requires a database connection");
            bail!("migrate is not a store command")
        }
    }
}
