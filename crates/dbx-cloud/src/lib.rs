//! # dbx Cloud
//!
//! Uploads backup artifacts to object storage by shelling out to the
//! provider CLIs (`aws`, `gsutil`, `az`).
//!
//! Every upload identifier is looked up in the same order: the job's own
//! parameter, then the configuration (which already carries `DBX_*`
//! environment overrides), then a hardcoded default where one exists.

pub mod error;
pub mod provider;
pub mod target;
pub mod uploader;

pub use error::CloudError;
pub use provider::CloudProvider;
pub use target::{object_key, upload_requested, UploadTarget, DEFAULT_PREFIX};
pub use uploader::{ArtifactUploader, CliUploader};
