//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbxConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to do when the persisted schedule file cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptStatePolicy {
    /// Log a warning and start with an empty job list.
    #[default]
    Discard,
    /// Refuse to start the scheduler.
    Fail,
}

/// Whether a job may fire while its previous run is still in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    #[default]
    Allow,
    /// Drop the firing and log a warning.
    Skip,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// JSON file holding the registered jobs.
    #[serde(default = "default_schedules_file")]
    pub schedules_file: PathBuf,

    #[serde(default)]
    pub on_corrupt_state: CorruptStatePolicy,

    #[serde(default)]
    pub overlap: OverlapPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedules_file: default_schedules_file(),
            on_corrupt_state: CorruptStatePolicy::default(),
            overlap: OverlapPolicy::default(),
        }
    }
}

fn default_schedules_file() -> PathBuf {
    PathBuf::from("./config/schedules.json")
}

/// Backup tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Output directory used when a job or command does not name one.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Deadline for every backup, restore and upload subprocess.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Deadline for connectivity checks.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Compress SQLite copies and MongoDB dump directories.
    #[serde(default = "default_compress")]
    pub compress: bool,
}

impl BackupConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            tool_timeout_secs: default_tool_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            compress: default_compress(),
        }
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("./backups")
}

fn default_tool_timeout() -> u64 {
    3600
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_compress() -> bool {
    true
}

/// Cloud upload defaults.
///
/// Every field is the middle layer of the lookup chain
/// `job param -> this value -> hardcoded default`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Upload after every successful backup even when the job does not ask.
    #[serde(default)]
    pub auto_upload: bool,

    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub s3_bucket: Option<String>,

    #[serde(default)]
    pub s3_prefix: Option<String>,

    #[serde(default)]
    pub gcs_bucket: Option<String>,

    #[serde(default)]
    pub gcs_prefix: Option<String>,

    #[serde(default)]
    pub azure_account: Option<String>,

    #[serde(default)]
    pub azure_container: Option<String>,
}

/// Notification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Slack-compatible incoming webhook.
    #[serde(default)]
    pub slack_webhook: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
