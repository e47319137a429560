//! Backup and restore errors.

use std::path::PathBuf;

use thiserror::Error;

use dbx_core::ToolError;

use crate::kind::BackupKind;

#[derive(Debug, Error)]
pub enum BackupError {
    /// The vendor tool is missing, failed or timed out.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A parameter the operation needs was not supplied.
    #[error("{kind} {param} cannot be empty")]
    MissingParam {
        kind: BackupKind,
        param: &'static str,
    },

    #[error("Unsupported database type: {0} (use mysql, postgres, mongodb or sqlite)")]
    UnsupportedKind(String),

    #[error("Unsupported backup type: {0} (use full, incremental or differential)")]
    InvalidMode(String),

    /// The source database file or backup input does not exist.
    #[error("{what} not found: {}", .path.display())]
    SourceNotFound { what: &'static str, path: PathBuf },

    /// The tool succeeded but produced nothing.
    #[error("Backup file is empty: {}", .0.display())]
    EmptyArtifact(PathBuf),

    /// A table or collection was not present in the backup.
    #[error("{0}")]
    NotInBackup(String),

    #[error("Connection timed out after {0}s (possibly waiting for password input)")]
    ConnectionTimeout(u64),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    pub(crate) fn missing(kind: BackupKind, param: &'static str) -> Self {
        BackupError::MissingParam { kind, param }
    }
}
