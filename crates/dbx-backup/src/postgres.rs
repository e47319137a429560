//! PostgreSQL backup and restore through `pg_dump` and `pg_restore`.

use std::path::{Path, PathBuf};

use dbx_core::ToolCommand;
use tracing::{info, warn};

use crate::artifact::timestamp;
use crate::error::BackupError;
use crate::kind::{BackupKind, BackupMode};
use crate::metadata;
use crate::params::PostgresConn;
use crate::runner::BackupOptions;

fn command(program: &str, conn: &PostgresConn, opts: &BackupOptions) -> ToolCommand {
    let cmd = ToolCommand::new(program).args(conn.args()).timeout(opts.timeout);
    if conn.password.is_empty() {
        cmd
    } else {
        cmd.env("PGPASSWORD", &conn.password)
    }
}

fn ensure_exists(file: &Path) -> Result<(), BackupError> {
    if file.exists() {
        Ok(())
    } else {
        Err(BackupError::SourceNotFound {
            what: "Backup file",
            path: file.to_path_buf(),
        })
    }
}

/// Dump `database` in custom format to `<out_dir>/<db>_<mode>_<ts>.dump`.
pub async fn backup(
    conn: &PostgresConn,
    database: &str,
    out_dir: &Path,
    mode: BackupMode,
    opts: &BackupOptions,
) -> Result<PathBuf, BackupError> {
    tokio::fs::create_dir_all(out_dir).await?;
    let out_file = out_dir.join(format!("{}_{}_{}.dump", database, mode, timestamp()));

    let mut cmd = command("pg_dump", conn, opts)
        .args(["-F", "c", "-f"])
        .arg(&out_file);
    if mode != BackupMode::Full {
        cmd = cmd.arg("--verbose");
    }

    info!("Running PostgreSQL {} backup of {}", mode, database);
    if let Err(e) = cmd.arg(database).output().await {
        let _ = tokio::fs::remove_file(&out_file).await;
        return Err(e.into());
    }

    match tokio::fs::metadata(&out_file).await {
        Ok(meta) if meta.len() > 0 => {}
        _ => return Err(BackupError::EmptyArtifact(out_file)),
    }

    metadata::record(out_dir, BackupKind::Postgres, database, mode, &out_file).await;
    Ok(out_file)
}

/// Restore a custom-format dump into `database`, dropping existing objects first.
pub async fn restore(
    conn: &PostgresConn,
    database: &str,
    file: &Path,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    ensure_exists(file)?;
    info!("Restoring PostgreSQL database {} from {}", database, file.display());
    command("pg_restore", conn, opts)
        .args(["-d", database, "-c"])
        .arg(file)
        .output()
        .await?;
    Ok(())
}

/// Restore a single table from a custom-format dump.
pub async fn restore_table(
    conn: &PostgresConn,
    database: &str,
    file: &Path,
    table: &str,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    if table.is_empty() {
        return Err(BackupError::missing(BackupKind::Postgres, "table name"));
    }
    ensure_exists(file)?;

    // An unreadable listing is not fatal; pg_restore reports the real error below.
    match ToolCommand::new("pg_restore")
        .arg("--list")
        .arg(file)
        .timeout(opts.timeout)
        .output()
        .await
    {
        Ok(listing) if !listing_has_table(&listing.stdout_lossy(), table) => {
            return Err(BackupError::NotInBackup(format!(
                "table '{}' not found in backup file. Use 'pg_restore --list {}' to see available tables",
                table,
                file.display()
            )));
        }
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Err(e.into()),
        Err(e) => warn!("Could not list {}: {}", file.display(), e),
    }

    info!("Restoring PostgreSQL table {}.{}", database, table);
    command("pg_restore", conn, opts)
        .args(["-d", database, "-t", table, "-c"])
        .arg(file)
        .output()
        .await?;
    Ok(())
}

/// Whether a `pg_restore --list` table of contents has a TABLE entry for `table`.
fn listing_has_table(listing: &str, table: &str) -> bool {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with(';'))
        .any(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            words
                .windows(3)
                .any(|w| (w[0] == "TABLE" || w[0] == "DATA") && w[2] == table)
        })
}
