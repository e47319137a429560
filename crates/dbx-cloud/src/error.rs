//! Cloud upload errors.

use std::path::PathBuf;

use thiserror::Error;

use dbx_core::ToolError;

#[derive(Debug, Error)]
pub enum CloudError {
    /// A bucket, container or account could not be resolved.
    #[error("{0}")]
    MissingIdentifier(String),

    #[error("Unsupported cloud provider: {0} (use s3, gcs or azure)")]
    UnsupportedProvider(String),

    /// No artifact matched the database prefix.
    #[error("No backup file found for {prefix} in {}", .dir.display())]
    NoArtifact { dir: PathBuf, prefix: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl CloudError {
    /// Configuration problems are never worth retrying.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CloudError::MissingIdentifier(_) | CloudError::UnsupportedProvider(_)
        )
    }
}
