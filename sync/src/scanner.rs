//! Ordered, pre-order directory traversal using walkdir

use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::comparator::FileIdentity;
use crate::error::{Result, SyncError};

/// Kind of a walked filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Anything that is not a directory, symbolic links included
    File,
    /// A directory
    Directory,
}

impl EntryKind {
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        if metadata.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }

    /// Whether this is a directory
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

/// What the walker should do after visiting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep going; descend if the entry is a directory
    Continue,
    /// Do not visit (or stat) anything below this directory
    SkipSubtree,
}

/// One filesystem object produced by a walk
#[derive(Debug, Clone)]
pub struct Entry {
    path: PathBuf,
    relative_path: PathBuf,
    kind: EntryKind,
    identity: FileIdentity,
}

impl Entry {
    /// Absolute path of the entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the walk root
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// File or directory
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this is a directory
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Identity token of the underlying object
    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    /// Same entry rooted somewhere else, for the counterpart lookup
    pub fn path_under(&self, other_root: &Path) -> PathBuf {
        other_root.join(&self.relative_path)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path.display())?;
        if self.is_dir() {
            write!(f, "{}", std::path::MAIN_SEPARATOR)?;
        }
        Ok(())
    }
}

/// Directory walker yielding entries sorted by name, parents first.
///
/// Symbolic links are reported as files and never followed. The walk root
/// itself is not visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker;

impl TreeWalker {
    /// Create a new walker
    pub fn new() -> Self {
        Self
    }

    /// Walk `root`, calling `visit` for every entry below it.
    ///
    /// An error from `visit` or from the filesystem stops the walk and is
    /// returned as is.
    pub fn walk<F>(&self, root: impl AsRef<Path>, mut visit: F) -> Result<()>
    where
        F: FnMut(&Entry) -> Result<WalkControl>,
    {
        let root = resolve_root(root.as_ref())?;

        let mut iter = WalkDir::new(&root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(result) = iter.next() {
            let dir_entry = result.map_err(|e| SyncError::traversal_error(&root, e))?;

            let metadata = dir_entry
                .metadata()
                .map_err(|e| SyncError::traversal_error(&root, e))?;

            let relative_path = dir_entry
                .path()
                .strip_prefix(&root)
                .map_err(|_| {
                    SyncError::invalid_root(dir_entry.path(), "entry escaped the walk root")
                })?
                .to_path_buf();

            let entry = Entry {
                path: dir_entry.path().to_path_buf(),
                relative_path,
                kind: EntryKind::from_metadata(&metadata),
                identity: FileIdentity::from_metadata(&metadata),
            };

            if visit(&entry)? == WalkControl::SkipSubtree && entry.is_dir() {
                iter.skip_current_dir();
            }
        }

        Ok(())
    }

    /// Collect every entry below `root` in walk order
    pub fn collect(&self, root: impl AsRef<Path>) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        self.walk(root, |entry| {
            entries.push(entry.clone());
            Ok(WalkControl::Continue)
        })?;
        Ok(entries)
    }
}

/// Make `root` absolute and check that it is an existing directory
pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        SyncError::invalid_root(root, format!("cannot read directory: {}", e))
    })?;

    if !metadata.is_dir() {
        return Err(SyncError::invalid_root(root, "path is not a directory"));
    }

    std::path::absolute(root)
        .map_err(|e| SyncError::invalid_root(root, format!("cannot resolve path: {}", e)))
}
