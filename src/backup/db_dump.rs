// pgbup/src/backup/db_dump.rs
use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::config::RunConfig;
use crate::utils::pgpass::CredentialEntry;
use crate::utils::{find_pg_dump_executable, run_command};

pub fn custom_artifact_name(database: &str, date_stamp: &str) -> String {
    format!("{}__{}.db", database, date_stamp)
}

pub fn plain_artifact_name(database: &str, date_stamp: &str) -> String {
    format!("{}__full_{}.sql.gz", database, date_stamp)
}

fn apply_credentials(cmd: &mut Command, credentials: Option<&CredentialEntry>) {
    if let Some(cred) = credentials {
        cmd.arg("-U").arg(&cred.username);
        // Password only ever travels through the child environment.
        cmd.env("PGPASSWORD", &cred.password);
    }
}

/// Dumps `database` in pg_dump's custom archive format.
///
/// The dump goes to a temporary file inside the destination directory and is
/// renamed into place only on success, so an interrupted run cannot leave a
/// truncated artifact under the final name. A same-day re-run overwrites that
/// day's artifact via the rename.
pub async fn dump_custom(
    config: &RunConfig,
    database: &str,
    credentials: Option<&CredentialEntry>,
) -> Result<PathBuf> {
    let pg_dump = find_pg_dump_executable()?;
    let tmp = NamedTempFile::new_in(&config.backup_dir).with_context(|| {
        format!(
            "Failed to create temporary dump file in {}",
            config.backup_dir.display()
        )
    })?;

    let mut cmd = Command::new(pg_dump);
    cmd.arg("--format=custom").arg("-f").arg(tmp.path());
    apply_credentials(&mut cmd, credentials);
    cmd.arg(database);

    let output = run_command(cmd, config.timeout)
        .await
        .with_context(|| format!("Failed to execute pg_dump (custom format) for {}", database))?;
    if !output.status.success() {
        anyhow::bail!(
            "pg_dump (custom format) for {} failed with status {}: {}",
            database,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let dest = config
        .backup_dir
        .join(custom_artifact_name(database, &config.date_stamp));
    tmp.persist(&dest)
        .with_context(|| format!("Failed to move completed dump into place at {}", dest.display()))?;
    Ok(dest)
}

/// Dumps `database` as portable SQL with per-row INSERT statements, streamed
/// through gzip.
///
/// `--column-inserts` trades dump speed for output that restores on any
/// server version with nothing but psql. The compressor runs in-process; the
/// dump stage (child plus stream copy) sits under the timeout and the child
/// is killed on every failure path.
pub async fn dump_plain_sql_gz(
    config: &RunConfig,
    database: &str,
    credentials: Option<&CredentialEntry>,
) -> Result<PathBuf> {
    let pg_dump = find_pg_dump_executable()?;
    let tmp = NamedTempFile::new_in(&config.backup_dir).with_context(|| {
        format!(
            "Failed to create temporary dump file in {}",
            config.backup_dir.display()
        )
    })?;
    let encoder = GzEncoder::new(
        tmp.reopen().context("Failed to reopen temporary dump file")?,
        Compression::default(),
    );

    let mut cmd = Command::new(pg_dump);
    cmd.arg("--column-inserts");
    apply_credentials(&mut cmd, credentials);
    cmd.arg(database);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to execute pg_dump (portable SQL) for {}", database))?;
    let stdout = child.stdout.take().context("pg_dump stdout was not captured")?;
    let stderr = child.stderr.take().context("pg_dump stderr was not captured")?;

    let (status, diagnostics) = match config.timeout {
        Some(limit) => {
            match tokio::time::timeout(limit, stream_dump(stdout, stderr, &mut child, encoder))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    let _ = child.kill().await;
                    anyhow::bail!(
                        "pg_dump for {} exceeded timeout of {}s",
                        database,
                        limit.as_secs()
                    );
                }
            }
        }
        None => stream_dump(stdout, stderr, &mut child, encoder).await?,
    };

    if !status.success() {
        anyhow::bail!(
            "pg_dump (portable SQL) for {} failed with status {}: {}",
            database,
            status,
            String::from_utf8_lossy(&diagnostics).trim()
        );
    }

    let dest = config
        .backup_dir
        .join(plain_artifact_name(database, &config.date_stamp));
    tmp.persist(&dest)
        .with_context(|| format!("Failed to move completed dump into place at {}", dest.display()))?;
    Ok(dest)
}

/// Copies the child's stdout into the gzip encoder while draining stderr,
/// then reaps the child. Draining both pipes together avoids a stall when
/// pg_dump fills the stderr pipe mid-dump.
async fn stream_dump<W: Write>(
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    child: &mut Child,
    mut encoder: GzEncoder<W>,
) -> Result<(ExitStatus, Vec<u8>)> {
    let copy_out = async move {
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = stdout
                .read(&mut buf)
                .await
                .context("Failed reading pg_dump output")?;
            if n == 0 {
                break;
            }
            encoder
                .write_all(&buf[..n])
                .context("Failed writing compressed dump")?;
        }
        encoder.finish().context("Failed to finish gzip stream")?;
        Ok::<_, anyhow::Error>(())
    };
    let copy_err = async move {
        let mut buf = Vec::new();
        stderr
            .read_to_end(&mut buf)
            .await
            .context("Failed reading pg_dump diagnostics")?;
        Ok::<_, anyhow::Error>(buf)
    };

    let (out_result, err_result) = tokio::join!(copy_out, copy_err);
    out_result?;
    let diagnostics = err_result?;
    let status = child.wait().await.context("Failed waiting for pg_dump")?;
    Ok((status, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names_carry_database_and_date() {
        assert_eq!(custom_artifact_name("sales", "2026-08-29"), "sales__2026-08-29.db");
        assert_eq!(
            plain_artifact_name("sales", "2026-08-29"),
            "sales__full_2026-08-29.sql.gz"
        );
    }

    #[test]
    fn test_artifact_names_are_distinct_per_format() {
        let custom = custom_artifact_name("sales", "2026-08-29");
        let plain = plain_artifact_name("sales", "2026-08-29");
        assert_ne!(custom, plain);
    }
}
