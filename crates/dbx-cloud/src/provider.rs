//! Storage providers.

use std::fmt;
use std::str::FromStr;

use crate::error::CloudError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloudProvider {
    #[default]
    S3,
    Gcs,
    Azure,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::S3 => "s3",
            CloudProvider::Gcs => "gcs",
            CloudProvider::Azure => "azure",
        }
    }

    /// The vendor CLI that performs the upload.
    pub fn cli(&self) -> &'static str {
        match self {
            CloudProvider::S3 => "aws",
            CloudProvider::Gcs => "gsutil",
            CloudProvider::Azure => "az",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudProvider {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(CloudProvider::S3),
            "gcs" => Ok(CloudProvider::Gcs),
            "azure" => Ok(CloudProvider::Azure),
            _ => Err(CloudError::UnsupportedProvider(s.to_string())),
        }
    }
}
