// pgbup/src/config/mod.rs
use anyhow::{Context, Result};
use chrono::Local;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKUP_DIR: &str = "/var/tmp/backup";
pub const ADMIN_DATABASE: &str = "postgres";
/// Account that can connect without per-database credentials (peer auth).
pub const SERVICE_ACCOUNT: &str = "postgres";

/// Three-valued reading of a flag-style environment variable.
///
/// Unset (or set to the empty string) is distinct from "explicitly off" so the
/// login-mode resolver can tell "operator said no" apart from "operator said
/// nothing". `"0"` means off; any other value means on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Absent,
    Off,
    On,
}

impl Toggle {
    pub fn from_env(name: &str) -> Toggle {
        match env::var(name) {
            Ok(val) => Toggle::from_value(&val),
            Err(_) => Toggle::Absent,
        }
    }

    pub fn from_value(val: &str) -> Toggle {
        match val {
            "" => Toggle::Absent,
            "0" => Toggle::Off,
            _ => Toggle::On,
        }
    }

    pub fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// Settings for one run, resolved from the environment before anything else
/// happens and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub explicit_login: bool,
    pub verbose: bool,
    /// None = no time bound on subprocess invocations.
    pub timeout: Option<Duration>,
    pub default_user: Option<String>,
    pub default_password: Option<String>,
    /// Database the enumeration query connects to.
    pub default_database: String,
    pub backup_dir: PathBuf,
    /// YYYY-MM-DD, baked into every artifact name for this run.
    pub date_stamp: String,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        let default_user = non_empty_var("PGBUP_DEFAULT_PGUSER");
        let default_password = non_empty_var("PGBUP_DEFAULT_PGPASSWORD");
        let default_database =
            non_empty_var("PGBUP_DEFAULT_PGDATABASE").unwrap_or_else(|| ADMIN_DATABASE.to_string());

        let explicit_login = resolve_explicit_login(
            Toggle::from_env("PGBUP_EXPLICIT_LOGIN"),
            invoking_user().as_deref(),
            default_user.is_some(),
        );

        let backup_dir = non_empty_var("PGBUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR));

        Ok(RunConfig {
            explicit_login,
            verbose: Toggle::from_env("PGBUP_VERBOSE").enabled(),
            timeout: parse_timeout(env::var("TIMEOUT").ok().as_deref())?,
            default_user,
            default_password,
            default_database,
            backup_dir,
            date_stamp: Local::now().format("%Y-%m-%d").to_string(),
        })
    }
}

/// Decides whether each database needs its own credentials from ~/.pgpass.
///
/// An operator override wins outright. Otherwise the postgres service account
/// and runs that already carry a default query user both get by on ambient
/// credentials.
pub fn resolve_explicit_login(
    override_toggle: Toggle,
    invoking_user: Option<&str>,
    default_user_present: bool,
) -> bool {
    match override_toggle {
        Toggle::On => true,
        Toggle::Off => false,
        Toggle::Absent => !(invoking_user == Some(SERVICE_ACCOUNT) || default_user_present),
    }
}

/// `TIMEOUT` in whole seconds; 0 (or unset) disables the bound entirely.
fn parse_timeout(raw: Option<&str>) -> Result<Option<Duration>> {
    match raw {
        None | Some("") => Ok(None),
        Some(val) => {
            let secs: u64 = val.parse().with_context(|| {
                format!("TIMEOUT must be a whole number of seconds, got '{}'", val)
            })?;
            Ok((secs > 0).then(|| Duration::from_secs(secs)))
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn invoking_user() -> Option<String> {
    non_empty_var("USER").or_else(|| non_empty_var("LOGNAME"))
}
