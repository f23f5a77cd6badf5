// pgbup/src/backup/mod.rs
pub(crate) mod db_dump;
mod logic;
pub mod retention;

pub use logic::{print_summary, BackupOutcome, DatabaseReport};

use anyhow::Result;

use crate::config::RunConfig;

/// Public entry point for the per-database backup phase.
pub async fn run_backup_flow(
    config: &RunConfig,
    databases: &[String],
) -> Result<Vec<DatabaseReport>> {
    logic::perform_backup_orchestration(config, databases).await
}
