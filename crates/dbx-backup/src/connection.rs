//! Connectivity checks run before a backup.

use std::time::Duration;

use dbx_core::{is_available, ToolCommand, ToolError};
use tracing::debug;

use crate::error::BackupError;
use crate::params::BackupTarget;

/// Mongo shells in order of preference.
const MONGO_SHELLS: [&str; 2] = ["mongosh", "mongo"];

/// Check that the database behind `target` accepts a connection.
///
/// Client tools are given `timeout` to answer; a client that blocks on a
/// password prompt is killed and reported as a timeout.
pub async fn test_connection(target: &BackupTarget, timeout: Duration) -> Result<(), BackupError> {
    let cmd = match target {
        BackupTarget::MySql { conn, database, .. } => {
            let cmd = ToolCommand::new("mysql")
                .args(conn.args())
                .args(["-e", "SELECT 1"])
                .arg(database);
            if conn.password.is_empty() {
                cmd
            } else {
                cmd.env("MYSQL_PWD", &conn.password)
            }
        }
        BackupTarget::Postgres { conn, database, .. } => {
            let cmd = ToolCommand::new("psql")
                .args(conn.args())
                .args(["-d", database.as_str(), "-c", "\\q"]);
            if conn.password.is_empty() {
                cmd
            } else {
                cmd.env("PGPASSWORD", &conn.password)
            }
        }
        BackupTarget::MongoDb { conn, .. } => {
            let shell = MONGO_SHELLS
                .into_iter()
                .find(|tool| is_available(tool))
                .ok_or_else(|| ToolError::not_found("mongosh"))?;
            ToolCommand::new(shell).args([
                conn.uri.as_str(),
                "--quiet",
                "--eval",
                "db.runCommand({ping:1})",
            ])
        }
        BackupTarget::Sqlite { path, .. } => {
            return match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => Ok(()),
                _ => Err(BackupError::SourceNotFound {
                    what: "SQLite database file",
                    path: path.clone(),
                }),
            };
        }
    };

    debug!("Testing {} connection with {}", target.kind(), cmd.program());
    match cmd.timeout(timeout).output().await {
        Ok(_) => Ok(()),
        Err(ToolError::Timeout { seconds, .. }) => Err(BackupError::ConnectionTimeout(seconds)),
        Err(e) => Err(e.into()),
    }
}
