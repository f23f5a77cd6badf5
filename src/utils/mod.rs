// pgbup/src/utils/mod.rs
pub mod databases;
pub mod pgpass;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use which::which;

/// Finds the psql executable in the system PATH.
pub fn find_psql_executable() -> Result<PathBuf> {
    which("psql").context("psql executable not found in PATH. Please ensure PostgreSQL client tools are installed and in your PATH.")
}

/// Finds the pg_dump executable in the system PATH.
pub fn find_pg_dump_executable() -> Result<PathBuf> {
    which("pg_dump").context("pg_dump executable not found in PATH. Please ensure PostgreSQL client tools are installed and in your PATH.")
}

/// Runs a subprocess to completion and captures its output.
///
/// With a timeout configured, overrunning the deadline fails the call and
/// tears the child down (`kill_on_drop`); downstream a timeout looks like any
/// other failed invocation.
pub async fn run_command(mut cmd: Command, timeout: Option<Duration>) -> Result<Output> {
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, cmd.output())
            .await
            .map_err(|_| anyhow::anyhow!("subprocess exceeded timeout of {}s", limit.as_secs()))?,
        None => cmd.output().await,
    };
    result.context("Failed to execute subprocess")
}

/// Makes sure the backup destination exists, is a directory, and is writable.
///
/// Creation is deliberately non-recursive: a missing parent is an operator
/// error, not something to paper over. Any failure here is fatal to the run.
pub fn prepare_backup_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir(dir).with_context(|| {
            format!(
                "Failed to create backup directory {} (its parent must already exist)",
                dir.display()
            )
        })?;
        println!("📂 Created backup directory {}", dir.display());
    }

    if !dir.is_dir() {
        anyhow::bail!("Backup destination {} exists but is not a directory", dir.display());
    }

    // Probe writability up front so a read-only mount fails the run before
    // any dump is attempted.
    tempfile::tempfile_in(dir)
        .with_context(|| format!("Backup directory {} is not writable", dir.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_missing_leaf_directory() -> Result<()> {
        let root = TempDir::new()?;
        let dest = root.path().join("backups");
        prepare_backup_dir(&dest)?;
        assert!(dest.is_dir());
        Ok(())
    }

    #[test]
    fn test_prepare_accepts_existing_directory() -> Result<()> {
        let root = TempDir::new()?;
        prepare_backup_dir(root.path())?;
        Ok(())
    }

    #[test]
    fn test_prepare_fails_when_parent_is_missing() -> Result<()> {
        let root = TempDir::new()?;
        let dest = root.path().join("missing-parent").join("backups");
        assert!(prepare_backup_dir(&dest).is_err());
        assert!(!dest.exists());
        Ok(())
    }

    #[test]
    fn test_prepare_rejects_regular_file() -> Result<()> {
        let root = TempDir::new()?;
        let dest = root.path().join("backups");
        std::fs::write(&dest, b"not a directory")?;
        assert!(prepare_backup_dir(&dest).is_err());
        Ok(())
    }
}
