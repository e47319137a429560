//! Artifact verification.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::BackupError;

/// Result of checking a backup artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub size: u64,
    /// Hex SHA-256, present when requested.
    pub sha256: Option<String>,
}

/// Check that `path` exists and is non-empty, optionally hashing it.
pub async fn verify_artifact(path: &Path, with_checksum: bool) -> Result<Verification, BackupError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::SourceNotFound {
                what: "Backup file",
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    // Dump directories (uncompressed MongoDB) count as non-empty when they hold anything.
    let size = if meta.is_dir() {
        let mut entries = tokio::fs::read_dir(path).await?;
        if entries.next_entry().await?.is_none() { 0 } else { meta.len().max(1) }
    } else {
        meta.len()
    };
    if size == 0 {
        return Err(BackupError::EmptyArtifact(path.to_path_buf()));
    }

    let sha256 = if with_checksum && meta.is_file() {
        Some(checksum(path).await?)
    } else {
        None
    };

    Ok(Verification { size, sha256 })
}

/// Hex-encoded SHA-256 of a file.
pub async fn checksum(path: &Path) -> Result<String, BackupError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_verify_reports_size_and_checksum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.sql");
        std::fs::write(&path, b"abc").unwrap();

        let v = verify_artifact(&path, true).await.unwrap();
        assert_eq!(v.size, 3);
        assert_eq!(
            v.sha256.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[tokio::test]
    async fn test_verify_without_checksum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.sql");
        std::fs::write(&path, b"abc").unwrap();
        assert!(verify_artifact(&path, false).await.unwrap().sha256.is_none());
    }

    #[tokio::test]
    async fn test_verify_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.sql");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            verify_artifact(&path, false).await,
            Err(BackupError::EmptyArtifact(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            verify_artifact(&dir.path().join("nope"), false).await,
            Err(BackupError::SourceNotFound { .. })
        ));
    }
}
