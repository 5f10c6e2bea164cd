//! Config and state file helpers for the Eloqua tap
//!
//! The tap reads its config from an explicit `--config` path or from
//! ~/.config/tap-eloqua/, and reads and writes Singer state documents at
//! paths given on the command line.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Name of the directory under the platform config dir
const APP_DIR: &str = "tap-eloqua";

/// Get the tap config directory (~/.config/tap-eloqua/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Get the path to a file within the tap config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Pick the file to read a config from.
///
/// An explicit path always wins, even if it does not exist (reading it then
/// reports the error). Otherwise `filename` in the tap config directory is
/// used when present. `None` means neither applies.
pub fn find_config(explicit: Option<&Path>, filename: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_path(filename).filter(|p| p.exists()),
    }
}

/// Load and parse a JSON file
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

/// Save a value as pretty JSON, creating parent directories as needed.
///
/// Writes to a sibling temp file first and renames it into place, so a
/// crash mid-write never leaves a truncated state file behind.
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("Failed to write file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tap-eloqua-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_config_path() {
        let path = config_path("config.json").unwrap();
        assert!(path.ends_with("tap-eloqua/config.json"));
    }

    #[test]
    fn test_explicit_config_wins() {
        let explicit = Path::new("/nonexistent/tap.json");
        assert_eq!(
            find_config(Some(explicit), "config.json"),
            Some(explicit.to_path_buf())
        );
    }

    #[test]
    fn test_missing_default_config() {
        assert_eq!(find_config(None, "no-such-file-for-tests.json"), None);
    }

    #[test]
    fn test_save_creates_parents_and_replaces() {
        let dir = scratch_dir("state");
        let path = dir.join("nested").join("state.json");

        let first = serde_json::json!({"bookmarks": {}});
        let second = serde_json::json!({"bookmarks": {"contacts": {"last_updated": "2024-01-01 00:00:00.000"}}});
        save_json_file(&path, &first).unwrap();
        save_json_file(&path, &second).unwrap();

        let loaded: serde_json::Value = load_json_file(&path).unwrap();
        assert_eq!(loaded, second);
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/nonexistent/tap-eloqua/config.json");
        let err = load_json_file::<serde_json::Value>(path).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = scratch_dir("invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_json_file::<serde_json::Value>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
