//! # dbx Notify
//!
//! Posts operation reports to a Slack-compatible incoming webhook.
//! Delivery is best effort: [`notify_logged`] waits for the post and only
//! logs failures.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use dbx_core::{format_duration, OperationReport};

/// Errors from delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to send Slack notification: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Status(reqwest::StatusCode),
}

/// Something that can announce a finished operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &OperationReport) -> Result<(), NotifyError>;
}

/// Sends reports to a Slack incoming webhook as `{"text": ...}`.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
    host: String,
    user: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url: webhook_url.into(),
            host: hostname(),
            user: username(),
        }
    }

    /// Override the host and user lines.
    pub fn with_origin(mut self, host: impl Into<String>, user: impl Into<String>) -> Self {
        self.host = host.into();
        self.user = user.into();
        self
    }

    /// Message body for `report`.
    pub fn message(&self, report: &OperationReport) -> String {
        let mut text = format!(
            "{} {} {}\nDatabase: {}\nDuration: {}\nHost: {}\nUser: {}",
            report.subject,
            report.operation,
            report.status,
            report.target,
            format_duration(report.duration),
            self.host,
            self.user
        );
        if let Some(err) = &report.error {
            text.push_str(&format!("\nError: {}", err));
        }
        text
    }
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.is_empty())
}

fn hostname() -> String {
    first_env(&["HOSTNAME", "COMPUTERNAME"])
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn username() -> String {
    first_env(&["USER", "USERNAME"]).unwrap_or_else(|| "unknown".to_string())
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, report: &OperationReport) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "text": self.message(report) });
        let resp = self.client.post(&self.webhook_url).json(&payload).send().await?;
        if resp.status().is_success() {
            debug!("Notification sent to Slack");
            Ok(())
        } else {
            Err(NotifyError::Status(resp.status()))
        }
    }
}

/// Deliver `report` and wait for it. Failures are logged at `warn`.
pub async fn notify_logged(notifier: &dyn Notifier, report: &OperationReport) {
    if let Err(e) = notifier.notify(report).await {
        warn!("Notification for {} {} failed: {}", report.subject, report.operation, e);
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
