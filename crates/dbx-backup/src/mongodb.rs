//! MongoDB backup and restore through `mongodump` and `mongorestore`.

use std::path::{Path, PathBuf};

use dbx_core::ToolCommand;
use tracing::{info, warn};

use crate::archive;
use crate::artifact::timestamp;
use crate::error::BackupError;
use crate::kind::{BackupKind, BackupMode};
use crate::metadata;
use crate::params::MongoConn;
use crate::runner::BackupOptions;

fn command(program: &str, conn: &MongoConn, database: &str, opts: &BackupOptions) -> ToolCommand {
    ToolCommand::new(program)
        .arg(format!("--uri={}", conn.uri))
        .arg(format!("--db={}", database))
        .timeout(opts.timeout)
}

/// Dump `database` into `<out_dir>/<db>_<ts>`, archived to `.tar.gz` when
/// compression is on.
///
/// A failed archive step keeps the plain dump directory as the artifact.
pub async fn backup(
    conn: &MongoConn,
    database: &str,
    out_dir: &Path,
    opts: &BackupOptions,
) -> Result<PathBuf, BackupError> {
    tokio::fs::create_dir_all(out_dir).await?;
    let dump_name = format!("{}_{}", database, timestamp());
    let dump_dir = out_dir.join(&dump_name);

    info!("Running MongoDB backup of {}", database);
    command("mongodump", conn, database, opts)
        .arg(format!("--out={}", dump_dir.display()))
        .output()
        .await?;

    let artifact = if opts.compress {
        let archive_path = out_dir.join(format!("{}.tar.gz", dump_name));
        let (src, dest) = (dump_dir.clone(), archive_path.clone());
        match tokio::task::spawn_blocking(move || archive::tar_gz_dir(&src, &dest)).await {
            Ok(Ok(())) => {
                let _ = tokio::fs::remove_dir_all(&dump_dir).await;
                archive_path
            }
            Ok(Err(e)) => {
                warn!("Compression failed, keeping dump directory: {}", e);
                dump_dir
            }
            Err(e) => {
                warn!("Compression task failed, keeping dump directory: {}", e);
                dump_dir
            }
        }
    } else {
        dump_dir
    };

    metadata::record(out_dir, BackupKind::MongoDb, database, BackupMode::Full, &artifact).await;
    Ok(artifact)
}

/// A restore input made ready for `mongorestore`.
///
/// Archives are unpacked into a temporary directory that lives as long as
/// this value.
struct RestoreSource {
    dir: PathBuf,
    _scratch: Option<tempfile::TempDir>,
}

async fn prepare_source(input: &Path) -> Result<RestoreSource, BackupError> {
    if !input.exists() {
        return Err(BackupError::SourceNotFound {
            what: "Backup directory",
            path: input.to_path_buf(),
        });
    }
    if input.is_dir() {
        return Ok(RestoreSource {
            dir: input.to_path_buf(),
            _scratch: None,
        });
    }

    let scratch = tempfile::TempDir::new()?;
    let (archive_path, dest) = (input.to_path_buf(), scratch.path().to_path_buf());
    tokio::task::spawn_blocking(move || archive::untar_gz(&archive_path, &dest))
        .await
        .map_err(std::io::Error::other)??;

    // The archive holds a single top-level dump directory.
    let mut entries = tokio::fs::read_dir(scratch.path()).await?;
    let mut dir = scratch.path().to_path_buf();
    if let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dir = entry.path();
        }
    }
    Ok(RestoreSource {
        dir,
        _scratch: Some(scratch),
    })
}

/// Resolve the directory holding `database`'s BSON files inside a dump.
fn database_dir(dump_dir: &Path, database: &str) -> PathBuf {
    let nested = dump_dir.join(database);
    if nested.is_dir() { nested } else { dump_dir.to_path_buf() }
}

/// Locate `<coll>.bson`, first under `<dir>/<db>/` then directly under `<dir>/`.
fn collection_file(dump_dir: &Path, database: &str, collection: &str) -> Option<PathBuf> {
    let file = format!("{}.bson", collection);
    [dump_dir.join(database).join(&file), dump_dir.join(&file)]
        .into_iter()
        .find(|p| p.is_file())
}

/// Restore `database` from a dump directory or `.tar.gz` archive, dropping
/// existing collections first.
pub async fn restore(
    conn: &MongoConn,
    database: &str,
    input: &Path,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    if database.is_empty() {
        return Err(BackupError::missing(BackupKind::MongoDb, "database name"));
    }
    let source = prepare_source(input).await?;
    let dir = database_dir(&source.dir, database);

    info!("Restoring MongoDB database {} from {}", database, dir.display());
    command("mongorestore", conn, database, opts)
        .arg("--drop")
        .arg(&dir)
        .output()
        .await?;
    Ok(())
}

/// Restore one collection from a dump directory or archive.
pub async fn restore_collection(
    conn: &MongoConn,
    database: &str,
    input: &Path,
    collection: &str,
    opts: &BackupOptions,
) -> Result<(), BackupError> {
    if database.is_empty() {
        return Err(BackupError::missing(BackupKind::MongoDb, "database name"));
    }
    if collection.is_empty() {
        return Err(BackupError::missing(BackupKind::MongoDb, "collection name"));
    }
    let source = prepare_source(input).await?;
    let file = collection_file(&source.dir, database, collection).ok_or_else(|| {
        BackupError::NotInBackup(format!(
            "collection '{}' not found in backup directory",
            collection
        ))
    })?;

    info!("Restoring MongoDB collection {}.{}", database, collection);
    command("mongorestore", conn, database, opts)
        .arg(format!("--collection={}", collection))
        .arg("--drop")
        .arg(&file)
        .output()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collection_file_prefers_nested_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("shop")).unwrap();
        std::fs::write(dir.path().join("shop").join("orders.bson"), b"x").unwrap();
        std::fs::write(dir.path().join("orders.bson"), b"y").unwrap();

        let found = collection_file(dir.path(), "shop", "orders").unwrap();
        assert_eq!(found, dir.path().join("shop").join("orders.bson"));
    }

    #[test]
    fn test_collection_file_flat_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orders.bson"), b"y").unwrap();

        let found = collection_file(dir.path(), "shop", "orders").unwrap();
        assert_eq!(found, dir.path().join("orders.bson"));
        assert!(collection_file(dir.path(), "shop", "users").is_none());
    }

    #[test]
    fn test_database_dir_falls_back_to_root() {
        let dir = TempDir::new().unwrap();
        assert_eq!(database_dir(dir.path(), "shop"), dir.path());
        std::fs::create_dir_all(dir.path().join("shop")).unwrap();
        assert_eq!(database_dir(dir.path(), "shop"), dir.path().join("shop"));
    }

    #[tokio::test]
    async fn test_prepare_source_unpacks_archive() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("shop_2024-01-01_00-00-00");
        std::fs::create_dir_all(dump.join("shop")).unwrap();
        std::fs::write(dump.join("shop").join("orders.bson"), b"bson").unwrap();
        let archive_path = dir.path().join("shop_2024-01-01_00-00-00.tar.gz");
        archive::tar_gz_dir(&dump, &archive_path).unwrap();

        let source = prepare_source(&archive_path).await.unwrap();
        assert!(collection_file(&source.dir, "shop", "orders").is_some());
    }

    #[tokio::test]
    async fn test_restore_collection_requires_name() {
        let conn = MongoConn {
            uri: "mongodb://localhost:27017".into(),
        };
        let err = restore_collection(&conn, "shop", Path::new("/tmp"), "", &BackupOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::MissingParam { .. }));
    }
}
