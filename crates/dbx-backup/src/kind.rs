//! Backup kinds and modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackupError;

/// The closed set of database kinds dbx can back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    MySql,
    Postgres,
    MongoDb,
    Sqlite,
}

impl BackupKind {
    pub const ALL: [BackupKind; 4] = [
        BackupKind::MySql,
        BackupKind::Postgres,
        BackupKind::MongoDb,
        BackupKind::Sqlite,
    ];

    /// Identifier used on the command line and in the schedule file.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::MySql => "mysql",
            BackupKind::Postgres => "postgres",
            BackupKind::MongoDb => "mongodb",
            BackupKind::Sqlite => "sqlite",
        }
    }

    /// Display name of the engine.
    pub fn label(&self) -> &'static str {
        match self {
            BackupKind::MySql => "MySQL",
            BackupKind::Postgres => "PostgreSQL",
            BackupKind::MongoDb => "MongoDB",
            BackupKind::Sqlite => "SQLite",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BackupKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(BackupKind::MySql),
            "postgres" | "postgresql" => Ok(BackupKind::Postgres),
            "mongodb" | "mongo" => Ok(BackupKind::MongoDb),
            "sqlite" => Ok(BackupKind::Sqlite),
            _ => Err(BackupError::UnsupportedKind(s.to_string())),
        }
    }
}

/// Backup type for the relational engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    #[default]
    Full,
    Incremental,
    Differential,
}

impl BackupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMode::Full => "full",
            BackupMode::Incremental => "incremental",
            BackupMode::Differential => "differential",
        }
    }
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupMode {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "full" => Ok(BackupMode::Full),
            "incremental" => Ok(BackupMode::Incremental),
            "differential" => Ok(BackupMode::Differential),
            _ => Err(BackupError::InvalidMode(s.to_string())),
        }
    }
}
