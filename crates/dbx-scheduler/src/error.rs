//! Scheduler errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::job::JobId;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression did not parse. Nothing was scheduled or persisted.
    #[error("Invalid cron expression '{expr}': {message}")]
    InvalidSchedule { expr: String, message: String },

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    /// The schedule file exists but could not be parsed.
    #[error("Schedule file {} is corrupt: {message}", .path.display())]
    CorruptState { path: PathBuf, message: String },

    #[error("Failed to read schedules from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist schedules to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize schedules: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SchedulerError {
    pub(crate) fn invalid_schedule(expr: &str, message: impl Into<String>) -> Self {
        SchedulerError::InvalidSchedule {
            expr: expr.to_string(),
            message: message.into(),
        }
    }
}
