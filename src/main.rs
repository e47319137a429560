//! dbx - database backup, restore and scheduled upload utility
//!
//! Main entry point for the dbx CLI.

mod cli;
mod cmd_db;
mod cmd_schedule;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dbx_backup::VendorBackupRunner;
use dbx_cloud::CliUploader;
use dbx_config::{ConfigLoader, DbxConfig, LoggingConfig};
use dbx_notify::{Notifier, SlackNotifier};
use dbx_scheduler::{JobDispatcher, Scheduler};

use crate::cli::{backup_params, Cli, Commands};
use crate::cmd_db::RestoreRequest;

const LOG_FILE: &str = "dbx.log";

/// Initialize tracing with console and file output.
///
/// The file layer writes to `<log dir>/dbx.log`. `RUST_LOG` overrides the
/// configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.dir)?;

    let file_appender = tracing_appender::rolling::never(&logging.dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard would stop the writer thread.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn notifier(config: &DbxConfig) -> Option<Arc<dyn Notifier>> {
    config
        .notify
        .slack_webhook
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| Arc::new(SlackNotifier::new(url.trim())) as Arc<dyn Notifier>)
}

fn dispatcher(config: &DbxConfig) -> JobDispatcher {
    let options = cmd_db::backup_options(config);
    let dispatcher = JobDispatcher::new(
        Arc::new(VendorBackupRunner::new(options)),
        Arc::new(CliUploader::new(config.backup.tool_timeout())),
        config.cloud.clone(),
        &config.backup.out_dir,
    );
    match notifier(config) {
        Some(notifier) => dispatcher.with_notifier(notifier),
        None => dispatcher,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConfigLoader::resolve(&cli.config)?;

    if let Commands::Logs { lines } = cli.command {
        return print_log_tail(&config.logging.dir.join(LOG_FILE), lines);
    }

    init_tracing(&config.logging)?;
    info!("dbx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Backup { kind, conn, mode, out, upload } => {
            let params = backup_params(&conn, mode, out.as_ref(), &upload);
            cmd_db::backup(&dispatcher(&config), kind, params).await
        }
        Commands::Restore { kind, conn, file, dir, table, collection, target } => {
            let Some(input) = file.or(dir) else {
                return Err("restore needs --file or --dir".into());
            };
            let request = RestoreRequest { input, table, collection, target };
            cmd_db::restore(&config, notifier(&config), kind, &conn, request).await
        }
        Commands::Schedule { action } => {
            let scheduler = Scheduler::new(config.scheduler.clone(), Arc::new(dispatcher(&config)));
            cmd_schedule::handle_schedule_command(&scheduler, action).await
        }
        Commands::Test { kind, conn } => cmd_db::test(&config, kind, &conn).await,
        Commands::Verify { file, checksum } => cmd_db::verify(&file, checksum).await,
        Commands::Logs { .. } => Ok(()),
    }
}

/// Print the last `lines` lines of the log file.
fn print_log_tail(path: &Path, lines: usize) -> Result<(), Box<dyn std::error::Error>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No log file at {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    for line in tail(&content, lines) {
        println!("{}", line);
    }
    Ok(())
}

fn tail(content: &str, lines: usize) -> Vec<&str> {
    let all: Vec<&str> = content.lines().collect();
    all[all.len().saturating_sub(lines)..].to_vec()
}
