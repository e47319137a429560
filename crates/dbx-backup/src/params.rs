//! Job parameter keys and the typed backup targets built from them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::BackupError;
use crate::kind::{BackupKind, BackupMode};

/// Free-form job parameters as persisted in the schedule file.
pub type Params = BTreeMap<String, String>;

/// Parameter keys shared by the command line and the schedule file.
pub mod keys {
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    pub const USER: &str = "user";
    pub const PASS: &str = "pass";
    pub const DBNAME: &str = "dbname";
    pub const URI: &str = "uri";
    pub const PATH: &str = "path";
    pub const OUT: &str = "out";
    pub const BACKUP_TYPE: &str = "backup_type";

    pub const UPLOAD_CLOUD: &str = "upload_cloud";
    pub const CLOUD_PROVIDER: &str = "cloud_provider";
    pub const S3_BUCKET: &str = "s3_bucket";
    pub const S3_PREFIX: &str = "s3_prefix";
    pub const GCS_BUCKET: &str = "gcs_bucket";
    pub const GCS_PREFIX: &str = "gcs_prefix";
    pub const AZURE_ACCOUNT: &str = "azure_account";
    pub const AZURE_CONTAINER: &str = "azure_container";
    pub const AZURE_BLOB: &str = "azure_blob";
}

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: &str = "5432";
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// MySQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlConn {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl MySqlConn {
    /// Host and user flags; the password travels in `MYSQL_PWD`.
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.host.is_empty() {
            args.extend(["-h".to_string(), self.host.clone()]);
        }
        if !self.user.is_empty() {
            args.extend(["-u".to_string(), self.user.clone()]);
        }
        args
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConn {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
}

impl PostgresConn {
    /// Host, port and user flags; the password travels in `PGPASSWORD`.
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.host.is_empty() {
            args.extend(["-h".to_string(), self.host.clone()]);
        }
        if !self.port.is_empty() {
            args.extend(["-p".to_string(), self.port.clone()]);
        }
        if !self.user.is_empty() {
            args.extend(["-U".to_string(), self.user.clone()]);
        }
        args
    }
}

/// MongoDB connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConn {
    pub uri: String,
}

/// A fully resolved backup request for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupTarget {
    MySql {
        conn: MySqlConn,
        database: String,
        out_dir: PathBuf,
        mode: BackupMode,
    },
    Postgres {
        conn: PostgresConn,
        database: String,
        out_dir: PathBuf,
        mode: BackupMode,
    },
    MongoDb {
        conn: MongoConn,
        database: String,
        out_dir: PathBuf,
    },
    Sqlite {
        path: PathBuf,
        out_dir: PathBuf,
    },
}

fn get<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map(|v| v.trim()).unwrap_or("")
}

fn get_or<'a>(params: &'a Params, key: &str, default: &'a str) -> &'a str {
    match get(params, key) {
        "" => default,
        value => value,
    }
}

impl BackupTarget {
    /// Pick the parameters `kind` needs out of `params`.
    ///
    /// `default_out` is used when `out` is absent. Missing database names
    /// (or the SQLite path) are rejected here, before any tool runs.
    pub fn from_params(
        kind: BackupKind,
        params: &Params,
        default_out: &Path,
    ) -> Result<Self, BackupError> {
        let out_dir = match get(params, keys::OUT) {
            "" => default_out.to_path_buf(),
            out => PathBuf::from(out),
        };
        let database = get(params, keys::DBNAME).to_string();
        let require_database = || {
            if database.is_empty() {
                Err(BackupError::missing(kind, "database name"))
            } else {
                Ok(())
            }
        };

        match kind {
            BackupKind::MySql => {
                require_database()?;
                Ok(BackupTarget::MySql {
                    conn: MySqlConn {
                        host: get_or(params, keys::HOST, DEFAULT_HOST).to_string(),
                        user: get(params, keys::USER).to_string(),
                        password: params.get(keys::PASS).cloned().unwrap_or_default(),
                    },
                    mode: get(params, keys::BACKUP_TYPE).parse()?,
                    database,
                    out_dir,
                })
            }
            BackupKind::Postgres => {
                require_database()?;
                Ok(BackupTarget::Postgres {
                    conn: PostgresConn {
                        host: get_or(params, keys::HOST, DEFAULT_HOST).to_string(),
                        port: get_or(params, keys::PORT, DEFAULT_POSTGRES_PORT).to_string(),
                        user: get(params, keys::USER).to_string(),
                        password: params.get(keys::PASS).cloned().unwrap_or_default(),
                    },
                    mode: get(params, keys::BACKUP_TYPE).parse()?,
                    database,
                    out_dir,
                })
            }
            BackupKind::MongoDb => {
                require_database()?;
                Ok(BackupTarget::MongoDb {
                    conn: MongoConn {
                        uri: get_or(params, keys::URI, DEFAULT_MONGO_URI).to_string(),
                    },
                    database,
                    out_dir,
                })
            }
            BackupKind::Sqlite => match get(params, keys::PATH) {
                "" => Err(BackupError::missing(kind, "database path")),
                path => Ok(BackupTarget::Sqlite {
                    path: PathBuf::from(path),
                    out_dir,
                }),
            },
        }
    }

    pub fn kind(&self) -> BackupKind {
        match self {
            BackupTarget::MySql { .. } => BackupKind::MySql,
            BackupTarget::Postgres { .. } => BackupKind::Postgres,
            BackupTarget::MongoDb { .. } => BackupKind::MongoDb,
            BackupTarget::Sqlite { .. } => BackupKind::Sqlite,
        }
    }

    pub fn out_dir(&self) -> &Path {
        match self {
            BackupTarget::MySql { out_dir, .. }
            | BackupTarget::Postgres { out_dir, .. }
            | BackupTarget::MongoDb { out_dir, .. }
            | BackupTarget::Sqlite { out_dir, .. } => out_dir,
        }
    }

    /// Name every artifact of this target starts with: the database name,
    /// or the SQLite file name without its extension.
    pub fn artifact_prefix(&self) -> String {
        match self {
            BackupTarget::MySql { database, .. }
            | BackupTarget::Postgres { database, .. }
            | BackupTarget::MongoDb { database, .. } => database.clone(),
            BackupTarget::Sqlite { path, .. } => sqlite_stem(path),
        }
    }

    /// Name shown in reports and notifications.
    pub fn display_name(&self) -> String {
        match self {
            BackupTarget::Sqlite { path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            _ => self.artifact_prefix(),
        }
    }
}

pub(crate) fn sqlite_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sqlite".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mysql_target_with_defaults() {
        let p = params(&[("dbname", "shop"), ("user", "root"), ("pass", "pw")]);
        let target = BackupTarget::from_params(BackupKind::MySql, &p, Path::new("./backups")).unwrap();
        match &target {
            BackupTarget::MySql { conn, database, out_dir, mode } => {
                assert_eq!(conn.host, "localhost");
                assert_eq!(conn.password, "pw");
                assert_eq!(database, "shop");
                assert_eq!(out_dir, Path::new("./backups"));
                assert_eq!(*mode, BackupMode::Full);
            }
            other => panic!("unexpected target {:?}", other),
        }
        assert_eq!(target.artifact_prefix(), "shop");
        assert_eq!(target.kind(), BackupKind::MySql);
    }

    #[test]
    fn test_postgres_target_reads_port_and_mode() {
        let p = params(&[
            ("dbname", "orders"),
            ("port", "6543"),
            ("out", "/srv/pg"),
            ("backup_type", "incremental"),
        ]);
        let target =
            BackupTarget::from_params(BackupKind::Postgres, &p, Path::new("./backups")).unwrap();
        match target {
            BackupTarget::Postgres { conn, mode, out_dir, .. } => {
                assert_eq!(conn.port, "6543");
                assert_eq!(mode, BackupMode::Incremental);
                assert_eq!(out_dir, PathBuf::from("/srv/pg"));
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_missing_database_rejected() {
        let err = BackupTarget::from_params(BackupKind::MongoDb, &Params::new(), Path::new("."))
            .unwrap_err();
        assert!(matches!(
            err,
            BackupError::MissingParam { kind: BackupKind::MongoDb, .. }
        ));
    }

    #[test]
    fn test_mongo_default_uri() {
        let p = params(&[("dbname", "events")]);
        let target = BackupTarget::from_params(BackupKind::MongoDb, &p, Path::new(".")).unwrap();
        match target {
            BackupTarget::MongoDb { conn, .. } => assert_eq!(conn.uri, DEFAULT_MONGO_URI),
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_sqlite_prefix_is_file_stem() {
        let p = params(&[("path", "/tmp/x.db"), ("out", "/tmp/backups")]);
        let target = BackupTarget::from_params(BackupKind::Sqlite, &p, Path::new(".")).unwrap();
        assert_eq!(target.artifact_prefix(), "x");
        assert_eq!(target.display_name(), "x.db");
        assert_eq!(target.out_dir(), Path::new("/tmp/backups"));
    }

    #[test]
    fn test_sqlite_requires_path() {
        let err =
            BackupTarget::from_params(BackupKind::Sqlite, &Params::new(), Path::new(".")).unwrap_err();
        assert_eq!(err.to_string(), "SQLite database path cannot be empty");
    }

    #[test]
    fn test_bad_backup_type_rejected() {
        let p = params(&[("dbname", "shop"), ("backup_type", "hourly")]);
        let err = BackupTarget::from_params(BackupKind::MySql, &p, Path::new(".")).unwrap_err();
        assert!(matches!(err, BackupError::InvalidMode(_)));
    }

    #[test]
    fn test_conn_args_skip_empty_values() {
        let conn = MySqlConn {
            host: "db.internal".to_string(),
            user: String::new(),
            password: "secret".to_string(),
        };
        assert_eq!(conn.args(), vec!["-h", "db.internal"]);

        let pg = PostgresConn {
            host: "localhost".to_string(),
            port: "5432".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        };
        assert_eq!(pg.args(), vec!["-h", "localhost", "-p", "5432", "-U", "postgres"]);
    }
}
