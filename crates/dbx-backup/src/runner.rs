//! Backup dispatch by kind.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use dbx_core::DEFAULT_TOOL_TIMEOUT;

use crate::error::BackupError;
use crate::params::BackupTarget;
use crate::{mongodb, mysql, postgres, sqlite};

/// Settings shared by every vendor invocation.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Deadline for each tool run.
    pub timeout: Duration,
    /// Gzip SQLite copies and archive MongoDB dump directories.
    pub compress: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
            compress: true,
        }
    }
}

/// Something that can produce a backup artifact for a target.
#[async_trait]
pub trait BackupRunner: Send + Sync {
    /// Run one backup and return the artifact path.
    async fn backup(&self, target: &BackupTarget) -> Result<PathBuf, BackupError>;
}

/// Runs backups with the vendor tools found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct VendorBackupRunner {
    options: BackupOptions,
}

impl VendorBackupRunner {
    pub fn new(options: BackupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BackupOptions {
        &self.options
    }
}

#[async_trait]
impl BackupRunner for VendorBackupRunner {
    async fn backup(&self, target: &BackupTarget) -> Result<PathBuf, BackupError> {
        let opts = &self.options;
        match target {
            BackupTarget::MySql {
                conn,
                database,
                out_dir,
                mode,
            } => mysql::backup(conn, database, out_dir, *mode, opts).await,
            BackupTarget::Postgres {
                conn,
                database,
                out_dir,
                mode,
            } => postgres::backup(conn, database, out_dir, *mode, opts).await,
            BackupTarget::MongoDb {
                conn,
                database,
                out_dir,
            } => mongodb::backup(conn, database, out_dir, opts).await,
            BackupTarget::Sqlite { path, out_dir } => sqlite::backup(path, out_dir, opts).await,
        }
    }
}
