//! SQLite backup and restore by file copy.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive;
use crate::artifact::timestamp;
use crate::error::BackupError;
use crate::params::sqlite_stem;
use crate::runner::BackupOptions;

/// Copy the database file to `<out_dir>/<stem>_<ts>.db`, gzipped to
/// `.db.gz` when compression is on.
pub async fn backup(path: &Path, out_dir: &Path, opts: &BackupOptions) -> Result<PathBuf, BackupError> {
    if !path.is_file() {
        return Err(BackupError::SourceNotFound {
            what: "SQLite database file",
            path: path.to_path_buf(),
        });
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let out_file = out_dir.join(format!("{}_{}.db", sqlite_stem(path), timestamp()));
    info!("Copying SQLite database {} to {}", path.display(), out_file.display());
    tokio::fs::copy(path, &out_file).await?;

    if !opts.compress {
        return Ok(out_file);
    }

    let mut gz_name = out_file.clone().into_os_string();
    gz_name.push(".gz");
    let gz_file = PathBuf::from(gz_name);
    let (src, dest) = (out_file.clone(), gz_file.clone());
    match tokio::task::spawn_blocking(move || archive::gzip_file(&src, &dest)).await {
        Ok(Ok(())) => {
            tokio::fs::remove_file(&out_file).await?;
            Ok(gz_file)
        }
        Ok(Err(e)) => {
            warn!("Compression failed, keeping uncompressed backup: {}", e);
            let _ = tokio::fs::remove_file(&gz_file).await;
            Ok(out_file)
        }
        Err(e) => {
            warn!("Compression task failed, keeping uncompressed backup: {}", e);
            Ok(out_file)
        }
    }
}

/// Where a restore lands when no target is given: `restored_<name>` next to
/// the backup, with any `.gz` suffix dropped.
pub fn default_restore_target(backup_file: &Path) -> PathBuf {
    let name = backup_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    backup_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("restored_{}", name))
}

/// Restore a backup file to `target` (or the default target), decompressing
/// `.gz` input. Returns the path written.
pub async fn restore(backup_file: &Path, target: Option<&Path>) -> Result<PathBuf, BackupError> {
    if !backup_file.is_file() {
        return Err(BackupError::SourceNotFound {
            what: "Backup file",
            path: backup_file.to_path_buf(),
        });
    }
    let target = match target {
        Some(t) => t.to_path_buf(),
        None => default_restore_target(backup_file),
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let gzipped = backup_file.extension().is_some_and(|ext| ext == "gz");
    if gzipped {
        let (src, dest) = (backup_file.to_path_buf(), target.clone());
        tokio::task::spawn_blocking(move || archive::gunzip_file(&src, &dest))
            .await
            .map_err(std::io::Error::other)??;
    } else {
        tokio::fs::copy(backup_file, &target).await?;
    }

    info!("SQLite database restored to {}", target.display());
    Ok(target)
}
