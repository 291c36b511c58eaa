//! Identity-based comparison of walked entries against the other tree

use std::fs;
use std::io;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::scanner::{Entry, EntryKind};

/// Opaque token naming one physical filesystem object.
///
/// Two tokens are equal exactly when they refer to the same object, i.e. the
/// paths they came from are hard links of each other. The token carries no
/// ordering and is not meant to be hashed.
#[derive(Debug, Clone)]
pub struct FileIdentity {
    inner: Option<DevIno>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DevIno {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    /// Identity of the object `metadata` was read from
    #[cfg(unix)]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            inner: Some(DevIno {
                dev: metadata.dev(),
                ino: metadata.ino(),
            }),
        }
    }

    /// Identity of the object `metadata` was read from
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &fs::Metadata) -> Self {
        Self { inner: None }
    }

    /// Whether both tokens name the same object.
    ///
    /// Fails when the platform gave no identity to compare.
    pub fn same_object(&self, other: &FileIdentity) -> Result<bool> {
        match (self.inner, other.inner) {
            (Some(a), Some(b)) => Ok(a == b),
            _ => Err(SyncError::UnsupportedPlatform),
        }
    }
}

impl PartialEq for FileIdentity {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.inner, other.inner), (Some(a), Some(b)) if a == b)
    }
}

impl Eq for FileIdentity {}

/// Why two entries at the same relative path clash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Both are files, but distinct objects
    DifferentObject,
    /// One side is a directory, the other is not
    KindMismatch,
}

/// Outcome of comparing an entry with the same relative path in the other tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Nothing lives at that path in the other tree
    Missing,
    /// Both are files and are the same object
    IdenticalLink,
    /// Same path, different object
    Conflict(ConflictKind),
    /// Both are directories
    DirectoryPresent,
}

impl Classification {
    /// Whether no action is needed to bring the other side in line
    pub fn is_in_sync(self) -> bool {
        matches!(self, Self::IdenticalLink | Self::DirectoryPresent)
    }
}

/// Classifies entry pairs by existence, kind and identity
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityComparator;

impl IdentityComparator {
    /// Create a new comparator
    pub fn new() -> Self {
        Self
    }

    /// Compare `entry` with whatever lives at `counterpart`.
    ///
    /// The counterpart is read with `symlink_metadata`, matching how the
    /// walker reads entries. A missing path, or a path whose parent is not a
    /// directory, is `Missing`; any other stat failure is an error.
    pub fn classify(&self, entry: &Entry, counterpart: &Path) -> Result<Classification> {
        let metadata = match fs::symlink_metadata(counterpart) {
            Ok(metadata) => metadata,
            Err(e) if is_absent(&e) => return Ok(Classification::Missing),
            Err(e) => return Err(SyncError::stat_error(counterpart, e)),
        };

        let classification = match (entry.kind(), EntryKind::from_metadata(&metadata)) {
            (EntryKind::Directory, EntryKind::Directory) => Classification::DirectoryPresent,
            (EntryKind::File, EntryKind::File) => {
                let other = FileIdentity::from_metadata(&metadata);
                if entry.identity().same_object(&other)? {
                    Classification::IdenticalLink
                } else {
                    Classification::Conflict(ConflictKind::DifferentObject)
                }
            }
            _ => Classification::Conflict(ConflictKind::KindMismatch),
        };

        Ok(classification)
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
