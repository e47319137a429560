//! Persisted job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use dbx_backup::{BackupKind, Params};

/// Identifier assigned by the schedule engine.
pub type JobId = u64;

/// A recurring backup job as stored in the schedule file.
///
/// Serialized as `{"id", "db_type", "schedule", "params", "created_at"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    #[serde(rename = "db_type")]
    pub kind: BackupKind,

    /// Cron expression as the user wrote it.
    pub schedule: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Params,

    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: JobId, kind: BackupKind, schedule: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            kind,
            schedule: schedule.into(),
            params,
            created_at: Utc::now(),
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
    Ok(Option::<Params>::deserialize(deserializer)?.unwrap_or_default())
}
