//! Turns a firing into a backup, and a successful backup into an upload.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use dbx_backup::{keys, latest_artifact, BackupKind, BackupRunner, BackupTarget, Params};
use dbx_cloud::{upload_requested, ArtifactUploader, CloudError, UploadTarget};
use dbx_config::CloudConfig;
use dbx_core::OperationReport;
use dbx_notify::{notify_logged, Notifier};

/// What happened to the upload step of a firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Neither the job nor the configuration asked for an upload, or the
    /// backup failed.
    NotRequested,
    Uploaded { destination: String },
    Failed { error: String },
}

/// Outcome of one firing.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub backup: OperationReport,
    pub artifact: Option<PathBuf>,
    pub upload: UploadStatus,
}

impl DispatchReport {
    pub fn backup_succeeded(&self) -> bool {
        self.backup.is_success()
    }
}

/// Runs the backup for a job's kind and the optional upload after it.
pub struct JobDispatcher {
    runner: Arc<dyn BackupRunner>,
    uploader: Arc<dyn ArtifactUploader>,
    notifier: Option<Arc<dyn Notifier>>,
    cloud: CloudConfig,
    default_out: PathBuf,
}

impl JobDispatcher {
    pub fn new(
        runner: Arc<dyn BackupRunner>,
        uploader: Arc<dyn ArtifactUploader>,
        cloud: CloudConfig,
        default_out: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            uploader,
            notifier: None,
            cloud,
            default_out: default_out.into(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Back up, report, then upload if asked to.
    ///
    /// Never fails: every error ends up in the returned report and the log.
    pub async fn dispatch(&self, kind: BackupKind, params: &Params) -> DispatchReport {
        let target = BackupTarget::from_params(kind, params, &self.default_out);
        let name = match &target {
            Ok(target) => target.display_name(),
            Err(_) => fallback_name(params),
        };

        let pending = OperationReport::begin(kind.label(), "Backup", name);
        let result = match target {
            Ok(target) => self
                .runner
                .backup(&target)
                .await
                .map(|artifact| (target, artifact)),
            Err(e) => Err(e),
        };
        let report = pending.finish(&result);
        report.emit();
        if let Some(notifier) = &self.notifier {
            notify_logged(notifier.as_ref(), &report).await;
        }

        let Ok((target, artifact)) = result else {
            return DispatchReport {
                backup: report,
                artifact: None,
                upload: UploadStatus::NotRequested,
            };
        };

        let upload = if upload_requested(params, &self.cloud) {
            match self.upload(&target, params).await {
                Ok(destination) => {
                    info!("Backup uploaded to {}", destination);
                    UploadStatus::Uploaded { destination }
                }
                Err(e) => {
                    warn!("Cloud upload failed: {}", e);
                    UploadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            }
        } else {
            UploadStatus::NotRequested
        };

        DispatchReport {
            backup: report,
            artifact: Some(artifact),
            upload,
        }
    }

    /// Upload the newest artifact whose name starts with the database name.
    async fn upload(&self, target: &BackupTarget, params: &Params) -> Result<String, CloudError> {
        let destination = UploadTarget::resolve(params, &self.cloud)?;
        let prefix = target.artifact_prefix();
        let artifact = latest_artifact(target.out_dir(), &prefix).ok_or_else(|| {
            CloudError::NoArtifact {
                dir: target.out_dir().to_path_buf(),
                prefix,
            }
        })?;
        self.uploader.upload(&artifact, &destination).await
    }
}

fn fallback_name(params: &Params) -> String {
    [keys::DBNAME, keys::PATH]
        .iter()
        .filter_map(|k| params.get(*k))
        .find(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
