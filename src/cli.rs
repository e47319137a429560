//! CLI definitions for dbx.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use dbx_backup::{keys, BackupKind, BackupMode, Params};
use dbx_config::DEFAULT_CONFIG_PATH;

/// dbx CLI.
#[derive(Parser)]
#[command(name = "dbx")]
#[command(about = "Back up, restore and schedule database dumps")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Back up a database now
    Backup {
        /// Database kind (mysql, postgres, mongo, sqlite)
        kind: BackupKind,

        #[command(flatten)]
        conn: ConnArgs,

        /// Backup type for MySQL and PostgreSQL
        #[arg(long)]
        mode: Option<BackupMode>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        upload: UploadArgs,
    },

    /// Restore a database from a backup
    Restore {
        /// Database kind (mysql, postgres, mongo, sqlite)
        kind: BackupKind,

        #[command(flatten)]
        conn: ConnArgs,

        /// Backup file (.sql, .dump, .tar.gz, .db, .db.gz)
        #[arg(short, long, conflicts_with = "dir")]
        file: Option<PathBuf>,

        /// MongoDB dump directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Restore a single table (MySQL, PostgreSQL)
        #[arg(long, conflicts_with = "collection")]
        table: Option<String>,

        /// Restore a single collection (MongoDB)
        #[arg(long)]
        collection: Option<String>,

        /// Where to write the restored SQLite file
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Scheduled backup management
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Check that a database is reachable
    Test {
        /// Database kind (mysql, postgres, mongo, sqlite)
        #[arg(long = "db")]
        kind: BackupKind,

        #[command(flatten)]
        conn: ConnArgs,
    },

    /// Check that a backup artifact exists and is not empty
    Verify {
        /// Backup file or dump directory
        file: PathBuf,

        /// Also print the SHA-256 of the file
        #[arg(long)]
        checksum: bool,
    },

    /// Show the end of the log file
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: usize,
    },
}

#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// Register a recurring backup
    Add {
        /// Database kind (mysql, postgres, mongo, sqlite)
        #[arg(long = "db")]
        kind: BackupKind,

        /// Cron expression, e.g. "0 2 * * *" or "@daily"
        #[arg(long)]
        cron: String,

        #[command(flatten)]
        conn: ConnArgs,

        /// Backup type for MySQL and PostgreSQL
        #[arg(long)]
        mode: Option<BackupMode>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        upload: UploadArgs,
    },

    /// List registered jobs
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Remove a job
    Remove {
        /// Job ID
        id: u64,
    },

    /// Run the scheduler in the foreground until Ctrl-C
    Run,

    /// Run one firing of a job now
    Trigger {
        /// Job ID
        id: u64,
    },
}

/// Connection flags shared by every database command.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConnArgs {
    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port (PostgreSQL)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "DBX_PASSWORD", hide_env_values = true)]
    pub pass: Option<String>,

    /// Database name
    #[arg(long = "dbname", visible_alias = "database")]
    pub dbname: Option<String>,

    /// MongoDB connection URI
    #[arg(long)]
    pub uri: Option<String>,

    /// SQLite database file
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Cloud upload flags.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct UploadArgs {
    /// Upload the backup after it succeeds
    #[arg(long)]
    pub upload: bool,

    /// Cloud provider (s3, gcs, azure)
    #[arg(long)]
    pub cloud: Option<String>,

    #[arg(long)]
    pub s3_bucket: Option<String>,

    #[arg(long)]
    pub s3_prefix: Option<String>,

    #[arg(long)]
    pub gcs_bucket: Option<String>,

    #[arg(long)]
    pub gcs_prefix: Option<String>,

    #[arg(long)]
    pub azure_account: Option<String>,

    #[arg(long)]
    pub azure_container: Option<String>,

    /// Blob name (defaults to the artifact file name)
    #[arg(long)]
    pub azure_blob: Option<String>,
}

fn put(params: &mut Params, key: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.insert(key.to_string(), value);
    }
}

impl ConnArgs {
    pub(crate) fn write_params(&self, params: &mut Params) {
        put(params, keys::HOST, self.host.clone());
        put(params, keys::PORT, self.port.map(|p| p.to_string()));
        put(params, keys::USER, self.user.clone());
        put(params, keys::PASS, self.pass.clone());
        put(params, keys::DBNAME, self.dbname.clone());
        put(params, keys::URI, self.uri.clone());
        put(params, keys::PATH, self.path.as_ref().map(|p| p.display().to_string()));
    }

    pub(crate) fn to_params(&self) -> Params {
        let mut params = Params::new();
        self.write_params(&mut params);
        params
    }
}

impl UploadArgs {
    pub(crate) fn write_params(&self, params: &mut Params) {
        if self.upload {
            params.insert(keys::UPLOAD_CLOUD.to_string(), "true".to_string());
        }
        put(params, keys::CLOUD_PROVIDER, self.cloud.clone());
        put(params, keys::S3_BUCKET, self.s3_bucket.clone());
        put(params, keys::S3_PREFIX, self.s3_prefix.clone());
        put(params, keys::GCS_BUCKET, self.gcs_bucket.clone());
        put(params, keys::GCS_PREFIX, self.gcs_prefix.clone());
        put(params, keys::AZURE_ACCOUNT, self.azure_account.clone());
        put(params, keys::AZURE_CONTAINER, self.azure_container.clone());
        put(params, keys::AZURE_BLOB, self.azure_blob.clone());
    }
}

/// The parameter map a backup command or a scheduled job runs with.
pub(crate) fn backup_params(
    conn: &ConnArgs,
    mode: Option<BackupMode>,
    out: Option<&PathBuf>,
    upload: &UploadArgs,
) -> Params {
    let mut params = conn.to_params();
    put(&mut params, keys::BACKUP_TYPE, mode.map(|m| m.to_string()));
    put(&mut params, keys::OUT, out.map(|p| p.display().to_string()));
    upload.write_params(&mut params);
    params
}
