//! Resolution of where an artifact should go.

use std::path::Path;

use dbx_backup::{keys, Params};
use dbx_config::CloudConfig;

use crate::error::CloudError;
use crate::provider::CloudProvider;

/// Key prefix used when neither the job nor the configuration sets one.
pub const DEFAULT_PREFIX: &str = "dbx/";

/// A fully resolved upload destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    S3 {
        bucket: String,
        prefix: String,
    },
    Gcs {
        bucket: String,
        prefix: String,
    },
    Azure {
        account: String,
        container: String,
        /// Blob name; the artifact's file name when unset.
        blob: Option<String>,
    },
}

/// Whether a finished backup should be uploaded.
pub fn upload_requested(params: &Params, config: &CloudConfig) -> bool {
    params.get(keys::UPLOAD_CLOUD).map(|v| v.trim()) == Some("true") || config.auto_upload
}

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `param -> config -> None`
fn lookup<'a>(params: &'a Params, key: &str, fallback: &'a Option<String>) -> Option<&'a str> {
    param(params, key).or_else(|| fallback.as_deref().map(str::trim).filter(|v| !v.is_empty()))
}

impl UploadTarget {
    /// Pick the provider and its identifiers for a job.
    pub fn resolve(params: &Params, config: &CloudConfig) -> Result<Self, CloudError> {
        let provider = match lookup(params, keys::CLOUD_PROVIDER, &config.provider) {
            Some(name) => name.parse()?,
            None => CloudProvider::default(),
        };

        match provider {
            CloudProvider::S3 => {
                let bucket = lookup(params, keys::S3_BUCKET, &config.s3_bucket).ok_or_else(|| {
                    CloudError::MissingIdentifier(
                        "S3 bucket name required (set s3_bucket in schedule params or DBX_S3_BUCKET env var)"
                            .to_string(),
                    )
                })?;
                let prefix = lookup(params, keys::S3_PREFIX, &config.s3_prefix).unwrap_or(DEFAULT_PREFIX);
                Ok(UploadTarget::S3 {
                    bucket: bucket.to_string(),
                    prefix: prefix.to_string(),
                })
            }
            CloudProvider::Gcs => {
                let bucket = lookup(params, keys::GCS_BUCKET, &config.gcs_bucket).ok_or_else(|| {
                    CloudError::MissingIdentifier(
                        "GCS bucket name required (set gcs_bucket in schedule params or DBX_GCS_BUCKET env var)"
                            .to_string(),
                    )
                })?;
                let prefix =
                    lookup(params, keys::GCS_PREFIX, &config.gcs_prefix).unwrap_or(DEFAULT_PREFIX);
                Ok(UploadTarget::Gcs {
                    bucket: bucket.to_string(),
                    prefix: prefix.to_string(),
                })
            }
            CloudProvider::Azure => {
                let account = lookup(params, keys::AZURE_ACCOUNT, &config.azure_account);
                let container = lookup(params, keys::AZURE_CONTAINER, &config.azure_container);
                match (account, container) {
                    (Some(account), Some(container)) => Ok(UploadTarget::Azure {
                        account: account.to_string(),
                        container: container.to_string(),
                        blob: param(params, keys::AZURE_BLOB).map(str::to_string),
                    }),
                    _ => Err(CloudError::MissingIdentifier(
                        "Azure account and container required (set azure_account and azure_container in schedule params or DBX_AZURE_ACCOUNT/DBX_AZURE_CONTAINER env vars)"
                            .to_string(),
                    )),
                }
            }
        }
    }

    pub fn provider(&self) -> CloudProvider {
        match self {
            UploadTarget::S3 { .. } => CloudProvider::S3,
            UploadTarget::Gcs { .. } => CloudProvider::Gcs,
            UploadTarget::Azure { .. } => CloudProvider::Azure,
        }
    }

    /// Human-readable destination of `artifact`, e.g. `s3://bucket/dbx/file`.
    pub fn destination(&self, artifact: &Path) -> String {
        match self {
            UploadTarget::S3 { bucket, prefix } => {
                format!("s3://{}/{}", bucket, object_key(prefix, artifact))
            }
            UploadTarget::Gcs { bucket, prefix } => {
                format!("gs://{}/{}", bucket, object_key(prefix, artifact))
            }
            UploadTarget::Azure {
                account,
                container,
                blob,
            } => format!(
                "https://{}.blob.core.windows.net/{}/{}",
                account,
                container,
                blob_name(blob.as_deref(), artifact)
            ),
        }
    }

    /// CLI arguments that upload `artifact` to this target.
    pub fn cli_args(&self, artifact: &Path) -> Vec<String> {
        let local = artifact.display().to_string();
        match self {
            UploadTarget::S3 { .. } => {
                vec!["s3".into(), "cp".into(), local, self.destination(artifact)]
            }
            UploadTarget::Gcs { .. } => vec!["cp".into(), local, self.destination(artifact)],
            UploadTarget::Azure {
                account,
                container,
                blob,
            } => vec![
                "storage".into(),
                "blob".into(),
                "upload".into(),
                "--account-name".into(),
                account.clone(),
                "--container-name".into(),
                container.clone(),
                "--name".into(),
                blob_name(blob.as_deref(), artifact),
                "--file".into(),
                local,
            ],
        }
    }
}

fn file_name(artifact: &Path) -> String {
    artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn blob_name(blob: Option<&str>, artifact: &Path) -> String {
    blob.map(str::to_string).unwrap_or_else(|| file_name(artifact))
}

/// Object key for `artifact` under `prefix`, joined with exactly one `/`.
pub fn object_key(prefix: &str, artifact: &Path) -> String {
    let name = file_name(artifact);
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
