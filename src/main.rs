//! pgbup — scheduled PostgreSQL backup runner.
//!
//! One run enumerates the server's databases, exports each of them twice
//! (custom archive plus gzipped portable SQL), then prunes artifacts older
//! than 90 days. Meant to be invoked from cron; the scheduler is expected to
//! prevent overlapping runs.

// pgbup/src/main.rs
mod backup;
mod config;
mod utils;

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::time::SystemTime;

use config::RunConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let config = RunConfig::from_env()
        .context("Failed to resolve run configuration from environment")?;
    if config.verbose {
        println!(
            "🚀 Starting backup run for {} into {}",
            config.date_stamp,
            config.backup_dir.display()
        );
        println!("   Explicit login: {}", config.explicit_login);
    }

    // Fatal section: without a database list and a writable destination there
    // is nothing useful to do.
    let databases = utils::databases::list_databases(&config)
        .await
        .context("Database enumeration failed; aborting run")?;
    if config.verbose {
        println!("🔍 Databases to back up: {:?}", databases);
    }
    utils::prepare_backup_dir(&config.backup_dir)
        .context("Backup destination is unavailable; aborting run")?;

    // Per-database failures are logged inside the orchestrator and do not
    // change the exit status.
    let reports = backup::run_backup_flow(&config, &databases).await?;
    backup::print_summary(&reports);

    // Housekeeping runs even when some backups failed this run.
    match backup::retention::prune_old_backups(&config.backup_dir, SystemTime::now()) {
        Ok(deleted) => {
            if config.verbose {
                println!("🧹 Pruned {} expired artifact(s)", deleted.len());
            }
        }
        Err(e) => eprintln!("⚠ Retention pruning failed: {:#}", e),
    }

    Ok(())
}
