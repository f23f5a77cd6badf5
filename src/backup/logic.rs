// pgbup/src/backup/logic.rs
use std::path::PathBuf;

use anyhow::Result;

use super::db_dump;
use crate::config::RunConfig;
use crate::utils::pgpass::{self, CredentialEntry};

/// Outcome of one database's backup. The two exports are tracked
/// independently so a custom-format failure is never masked by a later
/// SQL-format success.
#[derive(Debug)]
pub struct DatabaseReport {
    pub database: String,
    pub outcome: BackupOutcome,
}

#[derive(Debug)]
pub enum BackupOutcome {
    /// Explicit-login mode found no credentials entry; nothing was attempted.
    SkippedNoCredentials,
    Attempted {
        custom: Result<PathBuf, String>,
        plain: Result<PathBuf, String>,
    },
}

impl BackupOutcome {
    pub fn fully_successful(&self) -> bool {
        matches!(
            self,
            BackupOutcome::Attempted {
                custom: Ok(_),
                plain: Ok(_),
            }
        )
    }
}

/// Backs up every enumerated database in sequence. Per-database trouble is
/// logged and recorded; it never stops the loop and never fails the run.
pub async fn perform_backup_orchestration(
    config: &RunConfig,
    databases: &[String],
) -> Result<Vec<DatabaseReport>> {
    let credentials: Option<Vec<CredentialEntry>> = if config.explicit_login {
        Some(load_credentials())
    } else {
        None
    };

    let mut reports = Vec::with_capacity(databases.len());
    for database in databases {
        let entry = match &credentials {
            Some(entries) => match pgpass::lookup(entries, database) {
                Some(entry) => Some(entry),
                None => {
                    eprintln!("⚠ No credentials entry for {}; skipping", database);
                    reports.push(DatabaseReport {
                        database: database.clone(),
                        outcome: BackupOutcome::SkippedNoCredentials,
                    });
                    continue;
                }
            },
            None => None,
        };

        if config.verbose {
            println!("🔍 Backing up database: {}", database);
        }

        let custom = db_dump::dump_custom(config, database, entry).await;
        match &custom {
            Ok(path) => {
                if config.verbose {
                    println!("✓ Custom-format dump for {} written to {}", database, path.display());
                }
            }
            Err(e) => eprintln!("❌ Custom-format dump for {} failed: {:#}", database, e),
        }

        let plain = db_dump::dump_plain_sql_gz(config, database, entry).await;
        match &plain {
            Ok(path) => {
                if config.verbose {
                    println!("✓ SQL-format dump for {} written to {}", database, path.display());
                }
            }
            Err(e) => eprintln!("❌ SQL-format dump for {} failed: {:#}", database, e),
        }

        reports.push(DatabaseReport {
            database: database.clone(),
            outcome: BackupOutcome::Attempted {
                custom: custom.map_err(|e| format!("{:#}", e)),
                plain: plain.map_err(|e| format!("{:#}", e)),
            },
        });
    }

    Ok(reports)
}

/// An unreadable credentials file is not fatal: every explicit-login database
/// simply ends up with no matching entry and is skipped.
fn load_credentials() -> Vec<CredentialEntry> {
    match pgpass::pgpass_path().and_then(|path| pgpass::load_entries(&path)) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("⚠ Credentials file unavailable: {:#}; explicit-login databases will be skipped", e);
            Vec::new()
        }
    }
}

pub fn print_summary(reports: &[DatabaseReport]) {
    println!("=== Backup summary ===");
    for report in reports {
        match &report.outcome {
            BackupOutcome::SkippedNoCredentials => {
                println!("⚠ {}: skipped (no credentials entry)", report.database);
            }
            BackupOutcome::Attempted { custom, plain } => {
                let marker = if report.outcome.fully_successful() { "✅" } else { "❌" };
                println!(
                    "{} {}: custom {}, sql {}",
                    marker,
                    report.database,
                    status_word(custom),
                    status_word(plain)
                );
            }
        }
    }
}

fn status_word(result: &Result<PathBuf, String>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(_) => "FAILED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_is_not_fully_successful() {
        let outcome = BackupOutcome::Attempted {
            custom: Err("pg_dump exploded".to_string()),
            plain: Ok(PathBuf::from("/var/tmp/backup/sales__full_2026-08-29.sql.gz")),
        };
        assert!(!outcome.fully_successful());
    }

    #[test]
    fn test_both_exports_good_is_fully_successful() {
        let outcome = BackupOutcome::Attempted {
            custom: Ok(PathBuf::from("/var/tmp/backup/sales__2026-08-29.db")),
            plain: Ok(PathBuf::from("/var/tmp/backup/sales__full_2026-08-29.sql.gz")),
        };
        assert!(outcome.fully_successful());
    }

    #[test]
    fn test_skip_is_not_fully_successful() {
        assert!(!BackupOutcome::SkippedNoCredentials.fully_successful());
    }
}
