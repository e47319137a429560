//! Artifact naming and lookup.

use std::path::{Path, PathBuf};

use chrono::Local;
use glob::Pattern;

/// Timestamp embedded in artifact names; lexical order equals time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Current local time formatted for artifact names.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Most recent artifact in `out_dir` whose name starts with `prefix`.
///
/// Matches the glob `<out_dir>/<prefix>*` and returns the lexically greatest
/// path. This relies on artifact names sharing one sortable timestamp
/// format.
pub fn latest_artifact(out_dir: &Path, prefix: &str) -> Option<PathBuf> {
    if prefix.is_empty() {
        return None;
    }
    let pattern = format!(
        "{}/{}*",
        Pattern::escape(&out_dir.to_string_lossy()),
        Pattern::escape(prefix)
    );
    glob::glob(&pattern).ok()?.filter_map(Result::ok).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_latest_artifact_picks_lexically_greatest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dbA_2024-01-01.sql"), "a").unwrap();
        std::fs::write(dir.path().join("dbA_2024-02-01.sql"), "b").unwrap();
        std::fs::write(dir.path().join("dbB_2025-01-01.sql"), "c").unwrap();

        let latest = latest_artifact(dir.path(), "dbA").unwrap();
        assert_eq!(latest.file_name().unwrap(), "dbA_2024-02-01.sql");
    }

    #[test]
    fn test_latest_artifact_none_when_no_match() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("other_2024-01-01.sql"), "a").unwrap();
        assert!(latest_artifact(dir.path(), "dbA").is_none());
        assert!(latest_artifact(&dir.path().join("missing"), "dbA").is_none());
    }

    #[test]
    fn test_latest_artifact_escapes_glob_characters() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("db[1]_2024-01-01.sql"), "a").unwrap();
        std::fs::write(dir.path().join("db1_2024-05-01.sql"), "b").unwrap();

        let latest = latest_artifact(dir.path(), "db[1]").unwrap();
        assert_eq!(latest.file_name().unwrap(), "db[1]_2024-01-01.sql");
    }

    #[test]
    fn test_empty_prefix_matches_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("anything.sql"), "a").unwrap();
        assert!(latest_artifact(dir.path(), "").is_none());
    }

    #[test]
    fn test_timestamp_format_is_sortable() {
        let ts = timestamp();
        assert_eq!(ts.len(), "2024-01-01_00-00-00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
}
