//! Per-database backup bookkeeping.
//!
//! Stored as `.<kind>_<db>_metadata.json` in the output directory. The
//! leading dot keeps it out of the `<db>*` artifact glob.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BackupError;
use crate::kind::{BackupKind, BackupMode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub last_full: Option<DateTime<Utc>>,
    pub last_incremental: Option<DateTime<Utc>>,
    pub last_differential: Option<DateTime<Utc>>,
    /// Artifact written by the most recent backup.
    pub last_artifact: Option<PathBuf>,
}

impl BackupMetadata {
    pub fn path(out_dir: &Path, kind: BackupKind, database: &str) -> PathBuf {
        out_dir.join(format!(".{}_{}_metadata.json", kind.as_str(), database))
    }

    /// Read the metadata file, falling back to empty metadata when it is
    /// absent or unreadable.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring unreadable backup metadata {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), BackupError> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn mark(&mut self, mode: BackupMode, at: DateTime<Utc>, artifact: &Path) {
        match mode {
            BackupMode::Full => self.last_full = Some(at),
            BackupMode::Incremental => self.last_incremental = Some(at),
            BackupMode::Differential => self.last_differential = Some(at),
        }
        self.last_artifact = Some(artifact.to_path_buf());
    }
}

/// Record a finished backup. Failures are logged, never returned.
pub(crate) async fn record(
    out_dir: &Path,
    kind: BackupKind,
    database: &str,
    mode: BackupMode,
    artifact: &Path,
) {
    let path = BackupMetadata::path(out_dir, kind, database);
    let mut meta = BackupMetadata::load(&path).await;
    meta.mark(mode, Utc::now(), artifact);
    if let Err(e) = meta.save(&path).await {
        warn!("Failed to update backup metadata {}: {}", path.display(), e);
    }
}
