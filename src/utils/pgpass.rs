// pgbup/src/utils/pgpass.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One usable line of ~/.pgpass: `host:port:database:username:password`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Standard libpq location under the invoking user's home directory.
pub fn pgpass_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set; cannot locate ~/.pgpass")?;
    Ok(Path::new(&home).join(".pgpass"))
}

pub fn load_entries(path: &Path) -> Result<Vec<CredentialEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
    Ok(parse_entries(&content))
}

/// Comment lines, short lines, and lines with an empty username are skipped.
/// The password is the remainder of the line after the fourth separator, so
/// passwords containing colons survive intact.
pub fn parse_entries(content: &str) -> Vec<CredentialEntry> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<CredentialEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.splitn(5, ':');
    let host = fields.next()?;
    let port = fields.next()?;
    let database = fields.next()?;
    let username = fields.next()?;
    let password = fields.next()?;
    if username.is_empty() {
        return None;
    }
    Some(CredentialEntry {
        host: host.to_string(),
        port: port.to_string(),
        database: database.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// First entry for the database wins. Host and port are ignored on purpose:
/// this tool only ever talks to the one local server.
pub fn lookup<'a>(entries: &'a [CredentialEntry], database: &str) -> Option<&'a CredentialEntry> {
    entries.iter().find(|entry| entry.database == database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_entry_wins() {
        let entries = parse_entries("a:b:sales:alice:pw1\na:b:sales:bob:pw2\n");
        let resolved = lookup(&entries, "sales").unwrap();
        assert_eq!(resolved.username, "alice");
        assert_eq!(resolved.password, "pw1");
    }

    #[test]
    fn test_missing_database_resolves_to_none() {
        let entries = parse_entries("a:b:sales:alice:pw1\n");
        assert!(lookup(&entries, "reports").is_none());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let entries = parse_entries("# local credentials\n\nlocalhost:5432:sales:alice:pw1\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].database, "sales");
    }

    #[test]
    fn test_empty_username_is_skipped() {
        let entries = parse_entries("localhost:5432:sales::pw1\nlocalhost:5432:sales:alice:pw2\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "alice");
    }

    #[test]
    fn test_password_may_contain_colons() {
        let entries = parse_entries("localhost:5432:sales:alice:p:w:1\n");
        assert_eq!(entries[0].password, "p:w:1");
    }

    #[test]
    fn test_short_lines_are_rejected() {
        assert!(parse_entries("localhost:5432:sales\n").is_empty());
    }

    #[test]
    fn test_host_and_port_do_not_constrain_lookup() {
        let entries = parse_entries("otherhost:9999:sales:alice:pw1\n");
        assert!(lookup(&entries, "sales").is_some());
    }
}
