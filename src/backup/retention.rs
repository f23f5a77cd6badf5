// pgbup/src/backup/retention.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Artifacts older than this are pruned.
pub const RETENTION_DAYS: u64 = 90;

const PRUNED_SUFFIXES: &[&str] = &[".db", ".sql", ".sql.gz"];

/// Deletes backup artifacts in the top level of `dir` whose modification time
/// is more than [`RETENTION_DAYS`] before `now`. Subdirectories and files
/// with unrecognized names are left alone.
///
/// This is best-effort housekeeping: individual deletion failures are logged
/// and skipped; only an unreadable directory is an error. Callers pass `now`
/// so tests control the clock.
pub fn prune_old_backups(dir: &Path, now: SystemTime) -> Result<Vec<PathBuf>> {
    let cutoff = now - Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);
    let mut deleted = Vec::new();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read backup directory {}", dir.display()))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("⚠ Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file || !is_backup_artifact(&path) {
            continue;
        }

        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                eprintln!("⚠ Cannot read mtime of {}: {}", path.display(), e);
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }

        println!("🧹 Pruning expired backup {}", path.display());
        match fs::remove_file(&path) {
            Ok(()) => deleted.push(path),
            Err(e) => eprintln!("⚠ Failed to delete {}: {}", path.display(), e),
        }
    }

    Ok(deleted)
}

fn is_backup_artifact(path: &Path) -> bool {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => PRUNED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn far_future() -> SystemTime {
        // Every freshly created file is "expired" relative to this instant.
        SystemTime::now() + Duration::from_secs((RETENTION_DAYS + 1) * 24 * 60 * 60)
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_prunes_expired_artifacts_of_all_recognized_suffixes() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("sales__2026-01-01.db"), b"x")?;
        fs::write(dir.path().join("legacy_dump.sql"), b"x")?;
        fs::write(dir.path().join("sales__full_2026-01-01.sql.gz"), b"x")?;

        let deleted = prune_old_backups(dir.path(), far_future())?;
        assert_eq!(
            names(&deleted),
            vec!["legacy_dump.sql", "sales__2026-01-01.db", "sales__full_2026-01-01.sql.gz"]
        );
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_keeps_young_artifacts() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("sales__2026-08-29.db"), b"x")?;

        let deleted = prune_old_backups(dir.path(), SystemTime::now())?;
        assert!(deleted.is_empty());
        assert!(dir.path().join("sales__2026-08-29.db").exists());
        Ok(())
    }

    #[test]
    fn test_keeps_unrecognized_suffixes() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("notes.txt"), b"x")?;
        fs::write(dir.path().join("sales__2026-01-01.db.tmp"), b"x")?;

        let deleted = prune_old_backups(dir.path(), far_future())?;
        assert!(deleted.is_empty());
        Ok(())
    }

    #[test]
    fn test_does_not_descend_into_subdirectories() -> Result<()> {
        let dir = TempDir::new()?;
        let nested = dir.path().join("archive");
        fs::create_dir(&nested)?;
        fs::write(nested.join("old__2020-01-01.db"), b"x")?;

        let deleted = prune_old_backups(dir.path(), far_future())?;
        assert!(deleted.is_empty());
        assert!(nested.join("old__2020-01-01.db").exists());
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = prune_old_backups(Path::new("/definitely/not/a/real/dir"), SystemTime::now());
        assert!(result.is_err());
    }
}
