//! One-shot database subcommands: backup, restore, test and verify.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use dbx_backup::{
    mongodb, mysql, postgres, sqlite, test_connection, verify_artifact, BackupError, BackupKind,
    BackupOptions, BackupTarget, Params,
};
use dbx_config::DbxConfig;
use dbx_core::{format_duration, OperationReport};
use dbx_notify::{notify_logged, Notifier};
use dbx_scheduler::{DispatchReport, JobDispatcher, UploadStatus};

use crate::cli::ConnArgs;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Back up through the same dispatcher scheduled jobs use.
pub(crate) async fn backup(dispatcher: &JobDispatcher, kind: BackupKind, params: Params) -> CmdResult {
    let report = dispatcher.dispatch(kind, &params).await;
    print_dispatch(&report);
    if report.backup_succeeded() {
        Ok(())
    } else {
        Err(report
            .backup
            .error
            .unwrap_or_else(|| "backup failed".to_string())
            .into())
    }
}

/// Print a dispatch outcome for a human.
pub(crate) fn print_dispatch(report: &DispatchReport) {
    let backup = &report.backup;
    println!(
        "{} backup of {}: {} in {}",
        backup.subject,
        backup.target,
        backup.status,
        format_duration(backup.duration)
    );
    if let Some(artifact) = &report.artifact {
        println!("  artifact: {}", artifact.display());
    }
    if let Some(err) = &backup.error {
        println!("  error: {}", err);
    }
    match &report.upload {
        UploadStatus::NotRequested => {}
        UploadStatus::Uploaded { destination } => println!("  uploaded: {}", destination),
        UploadStatus::Failed { error } => println!("  upload failed: {}", error),
    }
}

/// What a restore reads from and what it restores.
pub(crate) struct RestoreRequest {
    pub input: PathBuf,
    pub table: Option<String>,
    pub collection: Option<String>,
    pub target: Option<PathBuf>,
}

impl RestoreRequest {
    fn operation(&self) -> String {
        match (&self.table, &self.collection) {
            (Some(table), _) => format!("RestoreTable({})", table),
            (_, Some(collection)) => format!("RestoreCollection({})", collection),
            _ => "Restore".to_string(),
        }
    }
}

pub(crate) async fn restore(
    config: &DbxConfig,
    notifier: Option<Arc<dyn Notifier>>,
    kind: BackupKind,
    conn: &ConnArgs,
    request: RestoreRequest,
) -> CmdResult {
    let options = backup_options(config);
    let name = conn
        .dbname
        .clone()
        .or_else(|| file_name(&request.input))
        .unwrap_or_else(|| "unknown".to_string());

    let pending = OperationReport::begin(kind.label(), request.operation(), name);
    let result = run_restore(config, kind, conn, &request, &options).await;
    let report = pending.finish(&result);
    report.emit();

    if let Some(notifier) = notifier {
        notify_logged(notifier.as_ref(), &report).await;
    }

    match result {
        Ok(Some(restored)) => {
            println!("Restored to {}", restored.display());
            Ok(())
        }
        Ok(None) => {
            println!("{} {} {}", report.subject, report.operation, report.status);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_restore(
    config: &DbxConfig,
    kind: BackupKind,
    conn: &ConnArgs,
    request: &RestoreRequest,
    options: &BackupOptions,
) -> Result<Option<PathBuf>, BackupError> {
    let input = request.input.as_path();
    if kind == BackupKind::Sqlite {
        let target = request.target.as_deref().or(conn.path.as_deref());
        return sqlite::restore(input, target).await.map(Some);
    }

    let target = BackupTarget::from_params(kind, &conn.to_params(), &config.backup.out_dir)?;
    match target {
        BackupTarget::MySql { conn, database, .. } => match &request.table {
            Some(table) => mysql::restore_table(&conn, &database, input, table, options).await?,
            None => mysql::restore(&conn, &database, input, options).await?,
        },
        BackupTarget::Postgres { conn, database, .. } => match &request.table {
            Some(table) => postgres::restore_table(&conn, &database, input, table, options).await?,
            None => postgres::restore(&conn, &database, input, options).await?,
        },
        BackupTarget::MongoDb { conn, database, .. } => match &request.collection {
            Some(coll) => {
                mongodb::restore_collection(&conn, &database, input, coll, options).await?
            }
            None => mongodb::restore(&conn, &database, input, options).await?,
        },
        BackupTarget::Sqlite { path, .. } => {
            return sqlite::restore(input, Some(&path)).await.map(Some);
        }
    }
    Ok(None)
}

pub(crate) async fn test(config: &DbxConfig, kind: BackupKind, conn: &ConnArgs) -> CmdResult {
    let target = BackupTarget::from_params(kind, &conn.to_params(), &config.backup.out_dir)?;
    info!("Testing {} connection to {}", kind, target.display_name());
    test_connection(&target, config.backup.connect_timeout()).await?;
    println!("{} connection to {} OK", kind, target.display_name());
    Ok(())
}

pub(crate) async fn verify(file: &Path, with_checksum: bool) -> CmdResult {
    let verification = verify_artifact(file, with_checksum).await?;
    println!("{}: OK ({} bytes)", file.display(), verification.size);
    if let Some(sha) = verification.sha256 {
        println!("sha256: {}", sha);
    }
    Ok(())
}

pub(crate) fn backup_options(config: &DbxConfig) -> BackupOptions {
    BackupOptions {
        timeout: config.backup.tool_timeout(),
        compress: config.backup.compress,
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
