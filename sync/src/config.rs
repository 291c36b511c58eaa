//! Options and ignore-file locations
//!
//! Nothing in here is process-global: the ignore file locations are plain
//! values handed to [`crate::filter::IgnoreMatcher::load`], so a caller can
//! point the engine at any pair of files.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Name of the ignore file looked up at the root of the source tree
pub const LOCAL_IGNORE_FILE_NAME: &str = ".driveignore";

/// Name of the per-user ignore file
pub const GLOBAL_IGNORE_FILE_NAME: &str = ".global_driveignore";

/// Directory under the user config dir holding the global ignore file
pub const CONFIG_DIR_NAME: &str = "driveignore";

/// Options for mirror, prune and unify runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOptions {
    /// Overwrite mirror files that share a path with a different source file
    #[serde(default)]
    pub force: bool,
    /// Combine global and local ignore files instead of picking one
    #[serde(default)]
    pub merge_ignores: bool,
    /// Record actions without touching the mirror
    #[serde(default)]
    pub dry_run: bool,
}

impl ReconciliationOptions {
    /// Options with `force` switched on
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Where the ignore rules for one invocation come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreSources {
    /// Ignore file inside the source tree
    pub local: PathBuf,
    /// Per-user ignore file, if the platform has a config directory
    pub global: Option<PathBuf>,
}

impl IgnoreSources {
    /// Sources with explicit paths
    pub fn new(local: impl Into<PathBuf>, global: Option<PathBuf>) -> Self {
        Self {
            local: local.into(),
            global,
        }
    }

    /// Local `.driveignore` under `source_root` plus the given global file
    pub fn for_source_root(source_root: impl AsRef<Path>, global: Option<PathBuf>) -> Self {
        Self::new(source_root.as_ref().join(LOCAL_IGNORE_FILE_NAME), global)
    }

    /// Local `.driveignore` under `source_root` plus the per-user file, when
    /// the platform has a config directory
    pub fn discover(source_root: impl AsRef<Path>) -> Self {
        Self::for_source_root(source_root, global_ignore_path().ok())
    }

    pub(crate) fn local_exists(&self) -> bool {
        self.local.is_file()
    }

    pub(crate) fn existing_global(&self) -> Option<&Path> {
        self.global.as_deref().filter(|path| path.is_file())
    }
}

/// Path of the per-user ignore file (`<config dir>/driveignore/.global_driveignore`)
pub fn global_ignore_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        SyncError::Config("could not determine the user configuration directory".to_string())
    })?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(GLOBAL_IGNORE_FILE_NAME))
}

/// Create an empty ignore file (and its parents) at `path` unless one exists.
///
/// Returns `true` when the file was created.
pub fn ensure_global_ignore_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::create_dir_error(parent, e))?;
    }
    fs::write(path, b"").map_err(|e| SyncError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!("created empty ignore file at '{}'", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_options_are_conservative() {
        let options = ReconciliationOptions::default();
        assert!(!options.force);
        assert!(!options.merge_ignores);
        assert!(!options.dry_run);
        assert!(options.forced().force);
    }

    #[test]
    fn test_options_deserialize_with_missing_fields() {
        let options: ReconciliationOptions = serde_json::from_str(r#"{"force": true}"#).unwrap();
        assert!(options.force);
        assert!(!options.merge_ignores);
        assert!(!options.dry_run);
    }

    #[test]
    fn test_sources_for_source_root() {
        let sources = IgnoreSources::for_source_root("/data/photos", None);
        assert_eq!(sources.local, PathBuf::from("/data/photos/.driveignore"));
        assert!(sources.global.is_none());
    }

    #[test]
    fn test_global_path_shape() {
        if let Ok(path) = global_ignore_path() {
            assert!(path.ends_with("driveignore/.global_driveignore"));
        }
    }

    #[test]
    fn test_ensure_global_ignore_file_creates_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cfg").join(GLOBAL_IGNORE_FILE_NAME);

        assert!(ensure_global_ignore_file(&path).unwrap());
        assert!(path.is_file());
        assert_eq!(fs::read(&path).unwrap(), b"");

        fs::write(&path, b"*.tmp\n").unwrap();
        assert!(!ensure_global_ignore_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "*.tmp\n");
    }
}
