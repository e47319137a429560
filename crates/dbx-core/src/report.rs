//! Structured operation reports.
//!
//! Every backup and restore attempt produces one [`OperationReport`]. It is
//! emitted as a `tracing` event under the `dbx::operations` target (which the
//! binary routes to the log file) and handed to the notifier.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

/// Final status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Success,
    Failed,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Success => write!(f, "SUCCESS"),
            OperationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// An operation that has started but not yet finished.
#[derive(Debug)]
pub struct PendingOperation {
    subject: String,
    operation: String,
    target: String,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl PendingOperation {
    /// Close the operation with its outcome.
    pub fn finish<T, E: fmt::Display>(self, result: &Result<T, E>) -> OperationReport {
        let (status, error) = match result {
            Ok(_) => (OperationStatus::Success, None),
            Err(e) => (OperationStatus::Failed, Some(e.to_string())),
        };
        OperationReport {
            subject: self.subject,
            operation: self.operation,
            target: self.target,
            status,
            started_at: self.started_at,
            duration: self.clock.elapsed(),
            error,
        }
    }
}

/// Outcome of one backup or restore attempt.
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    /// Database engine label, e.g. `MySQL`.
    pub subject: String,
    /// Operation label, e.g. `Backup` or `RestoreTable(users)`.
    pub operation: String,
    /// Database name or file the operation worked on.
    pub target: String,
    pub status: OperationStatus,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub error: Option<String>,
}

impl OperationReport {
    /// Start timing an operation.
    pub fn begin(
        subject: impl Into<String>,
        operation: impl Into<String>,
        target: impl Into<String>,
    ) -> PendingOperation {
        PendingOperation {
            subject: subject.into(),
            operation: operation.into(),
            target: target.into(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    /// Emit the report as a structured event.
    pub fn emit(&self) {
        let duration = format_duration(self.duration);
        match &self.error {
            None => info!(
                target: "dbx::operations",
                subject = %self.subject,
                operation = %self.operation,
                target_name = %self.target,
                status = %self.status,
                duration = %duration,
                "{} {} {} ({})",
                self.subject,
                self.operation,
                self.status,
                duration
            ),
            Some(err) => error!(
                target: "dbx::operations",
                subject = %self.subject,
                operation = %self.operation,
                target_name = %self.target,
                status = %self.status,
                duration = %duration,
                error = %err,
                "{} {} {} ({}): {}",
                self.subject,
                self.operation,
                self.status,
                duration,
                err
            ),
        }
    }

    /// Multi-line human summary used for notifications.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} {} {}\nDatabase: {}\nDuration: {}",
            self.subject,
            self.operation,
            self.status,
            self.target,
            format_duration(self.duration)
        );
        if let Some(err) = &self.error {
            text.push_str(&format!("\nError: {}", err));
        }
        text
    }
}

/// Format a duration rounded to whole seconds, e.g. `1h2m3s`.
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if duration.subsec_millis() >= 500 {
        secs += 1;
    }
    let (hours, rest) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, m) => format!("{}m{}s", m, seconds),
        (h, m) => format!("{}h{}m{}s", h, m, seconds),
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
