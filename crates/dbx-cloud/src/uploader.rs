//! Upload transports.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use dbx_core::{ToolCommand, DEFAULT_TOOL_TIMEOUT};

use crate::error::CloudError;
use crate::target::UploadTarget;

/// Moves an artifact to object storage.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Upload `artifact` and return its destination.
    async fn upload(&self, artifact: &Path, target: &UploadTarget) -> Result<String, CloudError>;
}

/// Uploads through the provider's command-line tool. Single shot, no retry.
#[derive(Debug, Clone)]
pub struct CliUploader {
    timeout: Duration,
}

impl CliUploader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CliUploader {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TIMEOUT)
    }
}

#[async_trait]
impl ArtifactUploader for CliUploader {
    async fn upload(&self, artifact: &Path, target: &UploadTarget) -> Result<String, CloudError> {
        let destination = target.destination(artifact);
        let cli = target.provider().cli();
        info!("Uploading {} to {}", artifact.display(), destination);

        ToolCommand::new(cli)
            .args(target.cli_args(artifact))
            .timeout(self.timeout)
            .output()
            .await?;

        info!("Uploaded {}", destination);
        Ok(destination)
    }
}
