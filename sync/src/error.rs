//! Error types for the reconciliation engine

use std::path::{Path, PathBuf};

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Every hard failure the engine can surface.
///
/// Conflicts found while mirroring without `force` are not errors; they are
/// collected as [`crate::report::ConflictWarning`]s on the report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Neither the local nor the global ignore file exists
    #[error("no local nor global .driveignore found (looked at '{}' and {})", .local.display(), display_optional(.global))]
    NoIgnoreConfig {
        local: PathBuf,
        global: Option<PathBuf>,
    },

    /// An ignore file could not be read or contains an invalid pattern
    #[error("failed to load ignore rules from '{path}': {source}")]
    IgnoreRules {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// Configuration could not be resolved
    #[error("configuration error: {0}")]
    Config(String),

    /// A walk root is missing or not a directory
    #[error("invalid root '{path}': {message}")]
    InvalidRoot { path: PathBuf, message: String },

    /// Reading a directory or an entry failed mid-walk
    #[error("failed to traverse '{path}': {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Stat of a counterpart path failed for a reason other than absence
    #[error("failed to read metadata of '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The hard link syscall failed (cross-device, permissions, ...)
    #[error("failed to link '{source_path}' to '{target}': {source}")]
    LinkCreation {
        source_path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory in the mirror failed
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing an entry from the mirror failed
    #[error("failed to remove '{path}': {source}")]
    Removal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the per-user ignore file failed
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The platform has no device/inode style file identity
    #[error("file identity is not supported on this platform")]
    UnsupportedPlatform,
}

fn display_optional(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!("'{}'", path.display()),
        None => "no global location".to_string(),
    }
}

impl SyncError {
    /// Create a new invalid root error
    pub fn invalid_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new traversal error, preferring the path the walker reports
    pub fn traversal_error(root: &Path, source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        Self::Traversal { path, source }
    }

    /// Create a new stat error
    pub fn stat_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Stat {
            path: path.into(),
            source,
        }
    }

    /// Create a new link creation error
    pub fn link_error(
        source_path: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::LinkCreation {
            source_path: source_path.into(),
            target: target.into(),
            source,
        }
    }

    /// Create a new directory creation error
    pub fn create_dir_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDirectory {
            path: path.into(),
            source,
        }
    }

    /// Create a new removal error
    pub fn removal_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Removal {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was raised before any tree was touched
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::NoIgnoreConfig { .. } | Self::IgnoreRules { .. } | Self::Config(_)
        )
    }
}
