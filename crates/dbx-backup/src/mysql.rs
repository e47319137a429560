//! MySQL backup and restore through `mysqldump` and `mysql`.

use std::path::{Path, PathBuf};

use dbx_core::ToolCommand;
use tracing::{debug, info};

use crate::artifact::timestamp;
use crate::error::BackupError;
use crate::kind::{BackupKind, BackupMode};
use crate::metadata;
use crate::params::MySqlConn;
use crate::runner::BackupOptions;

fn command(program: &str, conn: &MySqlConn, opts: &BackupOptions) -> ToolCommand {
    let cmd = ToolCommand::new(program).args(conn.args()).timeout(opts.timeout);
    if conn.password.is_empty() {
        cmd
    } else {
        cmd.env("MYSQL_PWD", &conn.password)
    }
}

fn mode_args(mode: BackupMode) -> &'static [&'static str] {
    match mode {
        BackupMode::Full => &[],
        BackupMode::Incremental => &["--master-data=2", "--flush-logs", "--single-transaction"],
        BackupMode::Differential => &["--master-data=2", "--single-transaction"],
    }
}

/// Dump `database` to `<out_dir>/<db>_<mode>_<ts>.sql`.
///
/// The dump is buffered and only written once `mysqldump` exits cleanly, so
/// a failed run never leaves a partial artifact behind.
pub async fn backup(
    conn: &MySqlConn,
    database: &str,
    out_dir: &Path,
    mode: BackupMode,
    opts: &BackupOptions,
) -> Result<PathBuf, BackupError> {
    tokio::fs::create_dir_all(out_dir).await?;
    let out_file = out_dir.join(format!("{}_{}_{}.sql", database, mode, timestamp()));

    info!("Running MySQL {} backup of {}", mode, database);
    let output = command("mysqldump", conn, opts)
        .args(mode_args(mode).iter().copied())
        .arg(database)
        .output()
        .await?;

    if output.stdout.is_empty() {
        return Err(BackupError::EmptyArtifact(out_file));
    }
    tokio::fs::write(&out_file, &output.stdout).await?;
    debug!("Wrote {} bytes to {}", output.stdout.len(), out_file.display());

    metadata::record(out_dir, BackupKind::MySql, database, mode, &out_file).await;
    Ok(out_file)
}

/// Load a dump file into `database`.
pub async fn restore(
    conn: &MySqlConn,
    database: &str,
    file: &Path,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    if !file.exists() {
        return Err(BackupError::SourceNotFound {
            what: "Backup file",
            path: file.to_path_buf(),
        });
    }
    info!("Restoring MySQL database {} from {}", database, file.display());
    command("mysql", conn, opts)
        .arg(database)
        .stdin_file(file)
        .output()
        .await?;
    Ok(())
}

/// Restore one table out of a full dump.
pub async fn restore_table(
    conn: &MySqlConn,
    database: &str,
    file: &Path,
    table: &str,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    if table.is_empty() {
        return Err(BackupError::missing(BackupKind::MySql, "table name"));
    }
    let dump = match tokio::fs::read(file).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::SourceNotFound {
                what: "Backup file",
                path: file.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let section = extract_table_section(&dump, table).ok_or_else(|| {
        BackupError::NotInBackup(format!("table '{}' not found in backup file", table))
    })?;

    info!("Restoring MySQL table {}.{}", database, table);
    command("mysql", conn, opts)
        .arg(database)
        .stdin_bytes(section)
        .output()
        .await?;
    Ok(())
}

/// Cut the statements for `table` out of a `mysqldump` file.
///
/// The section starts at its `CREATE TABLE` line and runs through the
/// `UNLOCK TABLES` that closes its data block. A `LOCK TABLES` line for the
/// same table is part of the section; one for another table ends it.
pub fn extract_table_section(dump: &str, table: &str) -> Option<String> {
    let mut section = String::new();
    let mut in_table = false;

    for line in dump.lines() {
        if !in_table {
            if created_table_name(line) == Some(table) {
                in_table = true;
                section.push_str(line);
                section.push('\n');
            }
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("LOCK TABLES") && !mentions_table(trimmed, table) {
            break;
        }
        section.push_str(line);
        section.push('\n');
        if trimmed.starts_with("UNLOCK TABLES") {
            break;
        }
    }

    (!section.is_empty()).then_some(section)
}

fn created_table_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("CREATE TABLE")?.trim_start();
    let rest = rest.strip_prefix("IF NOT EXISTS").map(str::trim_start).unwrap_or(rest);
    match rest.strip_prefix('`') {
        Some(quoted) => quoted.split('`').next(),
        None => rest.split(|c: char| c.is_whitespace() || c == '(').next(),
    }
}

fn mentions_table(line: &str, table: &str) -> bool {
    line.contains(&format!("`{}`", table))
        || line.split_whitespace().any(|word| word == table)
}
