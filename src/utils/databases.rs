// pgbup/src/utils/databases.rs
use anyhow::{Context, Result};
use tokio::process::Command;

use crate::config::RunConfig;
use crate::utils::{find_psql_executable, run_command};

/// Catalog names that are never backed up.
pub const RESERVED_DATABASES: &[&str] = &["postgres", "template0", "template1"];

const LIST_QUERY: &str =
    "SELECT datname FROM pg_database WHERE datname NOT IN ('postgres', 'template0', 'template1')";

/// Asks the server for every backup-eligible database name, in catalog order.
///
/// The default password, when configured, travels to psql via its environment
/// only; it never appears on a command line. A failure here aborts the whole
/// run, since without the list there is nothing to back up.
pub async fn list_databases(config: &RunConfig) -> Result<Vec<String>> {
    let psql_path = find_psql_executable()?;

    let mut cmd = Command::new(psql_path);
    cmd.arg("-X")
        .arg("-A")
        .arg("-t")
        .arg("-c")
        .arg(LIST_QUERY)
        .arg("-d")
        .arg(&config.default_database);
    if let Some(user) = &config.default_user {
        cmd.arg("-U").arg(user);
    }
    if let Some(password) = &config.default_password {
        cmd.env("PGPASSWORD", password);
    }

    let output = run_command(cmd, config.timeout)
        .await
        .context("Failed to run psql for database enumeration")?;

    if !output.status.success() {
        anyhow::bail!(
            "psql enumeration failed with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let databases = parse_database_listing(&String::from_utf8_lossy(&output.stdout));
    if databases.is_empty() {
        println!("⚠ Server reported no databases eligible for backup");
    }
    Ok(databases)
}

/// One name per line; blanks dropped, reserved names filtered again in case
/// the server-side exclusion ever drifts.
fn parse_database_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| !RESERVED_DATABASES.contains(name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_catalog_order() {
        let listing = "sales\nreports\nanalytics\n";
        assert_eq!(
            parse_database_listing(listing),
            vec!["sales", "reports", "analytics"]
        );
    }

    #[test]
    fn test_parse_drops_blank_lines_and_whitespace() {
        let listing = "  sales  \n\n\treports\n";
        assert_eq!(parse_database_listing(listing), vec!["sales", "reports"]);
    }

    #[test]
    fn test_parse_filters_exactly_the_reserved_names() {
        let listing = "postgres\nsales\ntemplate0\ntemplate1\ntemplate2\n";
        assert_eq!(parse_database_listing(listing), vec!["sales", "template2"]);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_database_listing("").is_empty());
        assert!(parse_database_listing("\n\n").is_empty());
    }
}
