/// Command-line arguments for `shelterhub-admin`
///
/// ```bash
/// shelterhub-admin repair --dry-run
/// shelterhub-admin backfill-roles
/// shelterhub-admin migrate
/// ```

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shelterhub-admin", about = "ShelterHub data maintenance", version)]
pub struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Print the JSON report on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile module keys: rename legacy rows, create missing modules, flag the rest
    Repair {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Create owner and volunteer role rows that are missing
    BackfillRoles,

    /// Create the database if needed and apply pending migrations
    Migrate,
}
