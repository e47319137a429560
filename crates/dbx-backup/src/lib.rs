//! # dbx Backup
//!
//! Backup, restore and connectivity checks for the four supported database
//! kinds. Relational and document stores are handled by their vendor tools
//! (`mysqldump`/`mysql`, `pg_dump`/`pg_restore`, `mongodump`/`mongorestore`);
//! SQLite is a plain file copy.
//!
//! Artifacts are written as `<name>_..._<timestamp>.<ext>` with a lexically
//! sortable timestamp, so [`latest_artifact`] can find the newest one by
//! prefix.

pub mod archive;
pub mod artifact;
pub mod connection;
pub mod error;
pub mod kind;
pub mod metadata;
pub mod mongodb;
pub mod mysql;
pub mod params;
pub mod postgres;
pub mod runner;
pub mod sqlite;
pub mod verify;

pub use artifact::{latest_artifact, timestamp, TIMESTAMP_FORMAT};
pub use connection::test_connection;
pub use error::BackupError;
pub use kind::{BackupKind, BackupMode};
pub use params::{keys, BackupTarget, MongoConn, MySqlConn, Params, PostgresConn};
pub use runner::{BackupOptions, BackupRunner, VendorBackupRunner};
pub use verify::{checksum, verify_artifact, Verification};
