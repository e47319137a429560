//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::DbxConfig;

/// Location of the config file when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/dbx.toml";

static ENV_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env reference pattern"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<DbxConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<DbxConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: DbxConfig = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults, then apply
    /// the process environment on top.
    pub fn resolve(path: &Path) -> Result<DbxConfig, ConfigError> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            DbxConfig::default()
        };
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `DBX_*` (and `SLACK_WEBHOOK`) variables onto `config`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(config: &mut DbxConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("DBX_AUTO_UPLOAD") {
            config.cloud.auto_upload = parse_bool("DBX_AUTO_UPLOAD", &value)?;
        }

        let cloud = &mut config.cloud;
        for (key, slot) in [
            ("DBX_CLOUD_PROVIDER", &mut cloud.provider),
            ("DBX_S3_BUCKET", &mut cloud.s3_bucket),
            ("DBX_S3_PREFIX", &mut cloud.s3_prefix),
            ("DBX_GCS_BUCKET", &mut cloud.gcs_bucket),
            ("DBX_GCS_PREFIX", &mut cloud.gcs_prefix),
            ("DBX_AZURE_ACCOUNT", &mut cloud.azure_account),
            ("DBX_AZURE_CONTAINER", &mut cloud.azure_container),
        ] {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        if let Some(value) = get("SLACK_WEBHOOK") {
            config.notify.slack_webhook = Some(value);
        }
        if let Some(value) = get("DBX_LOG_DIR") {
            config.logging.dir = PathBuf::from(Self::expand_path(&value));
        }

        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_REF.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut DbxConfig) {
        let expand = |p: &PathBuf| PathBuf::from(Self::expand_path(&p.to_string_lossy()));
        config.scheduler.schedules_file = expand(&config.scheduler.schedules_file);
        config.backup.out_dir = expand(&config.backup.out_dir);
        config.logging.dir = expand(&config.logging.dir);
    }

    /// Expand shell-style paths (e.g., `~/backups`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected true or false, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CorruptStatePolicy, OverlapPolicy};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.backup.tool_timeout_secs, 3600);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [scheduler]
            schedules_file = "/var/lib/dbx/schedules.json"
            on_corrupt_state = "fail"
            overlap = "skip"

            [backup]
            out_dir = "/srv/backups"
            compress = false

            [cloud]
            auto_upload = true
            provider = "gcs"
            gcs_bucket = "nightly"

            [notify]
            slack_webhook = "https://hooks.slack.com/services/T/B/X"

            [logging]
            level = "debug"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(
            config.scheduler.schedules_file,
            PathBuf::from("/var/lib/dbx/schedules.json")
        );
        assert_eq!(config.scheduler.on_corrupt_state, CorruptStatePolicy::Fail);
        assert_eq!(config.scheduler.overlap, OverlapPolicy::Skip);
        assert!(!config.backup.compress);
        assert!(config.cloud.auto_upload);
        assert_eq!(config.cloud.provider.as_deref(), Some("gcs"));
        assert_eq!(config.cloud.gcs_bucket.as_deref(), Some("nightly"));
        assert!(config.notify.slack_webhook.is_some());
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[backup]").unwrap();
        writeln!(file, "connect_timeout_secs = 9").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.backup.connect_timeout_secs, 9);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/dbx.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_DBX_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/backups");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/backups"));
    }

    #[test]
    fn test_apply_env_overrides_file_values() {
        let mut config = ConfigLoader::load_str(
            r#"
                [cloud]
                provider = "gcs"
                s3_bucket = "from-file"
            "#,
        )
        .unwrap();

        ConfigLoader::apply_env(
            &mut config,
            env(&[
                ("DBX_AUTO_UPLOAD", "true"),
                ("DBX_CLOUD_PROVIDER", "azure"),
                ("DBX_S3_BUCKET", "from-env"),
                ("DBX_AZURE_CONTAINER", "backups"),
                ("SLACK_WEBHOOK", "https://example.test/hook"),
                ("DBX_LOG_DIR", "/tmp/dbx-logs"),
            ]),
        )
        .unwrap();

        assert!(config.cloud.auto_upload);
        assert_eq!(config.cloud.provider.as_deref(), Some("azure"));
        assert_eq!(config.cloud.s3_bucket.as_deref(), Some("from-env"));
        assert_eq!(config.cloud.azure_container.as_deref(), Some("backups"));
        assert_eq!(
            config.notify.slack_webhook.as_deref(),
            Some("https://example.test/hook")
        );
        assert_eq!(config.logging.dir, PathBuf::from("/tmp/dbx-logs"));
    }

    #[test]
    fn test_apply_env_ignores_empty_values() {
        let mut config = ConfigLoader::load_str("[cloud]\ns3_prefix = \"nightly/\"").unwrap();
        ConfigLoader::apply_env(&mut config, env(&[("DBX_S3_PREFIX", "")])).unwrap();
        assert_eq!(config.cloud.s3_prefix.as_deref(), Some("nightly/"));
    }

    #[test]
    fn test_apply_env_rejects_bad_bool() {
        let mut config = DbxConfig::default();
        let result = ConfigLoader::apply_env(&mut config, env(&[("DBX_AUTO_UPLOAD", "maybe")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_resolve_missing_file_uses_defaults() {
        let config = ConfigLoader::resolve(Path::new("/nonexistent/dbx.toml")).unwrap();
        assert_eq!(config.backup.out_dir, PathBuf::from("./backups"));
    }
}
