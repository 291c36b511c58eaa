//! driveignore sync library
//!
//! Keeps a "mirror" directory (typically a drive sync folder) in step with a
//! source directory by hard-linking files instead of copying them:
//! - Gitignore-style `.driveignore` rules, local, global or merged
//! - Sorted pre-order directory walking with subtree skipping
//! - Identity comparison (device + inode), never content hashing
//! - Mirror, prune, diff and unify algorithms with dry-run support

pub mod scanner;
pub mod comparator;
pub mod diff;
pub mod filter;
pub mod sync_engine;
pub mod report;
pub mod config;
pub mod error;

use std::path::Path;

// Re-export main types and functions
pub use scanner::{TreeWalker, Entry, EntryKind, WalkControl};
pub use comparator::{IdentityComparator, Classification, ConflictKind, FileIdentity};
pub use diff::{DiffEngine, DiffReport, ReportedPath};
pub use filter::{IgnoreMatcher, IgnoreOrigin};
pub use sync_engine::ReconciliationEngine;
pub use report::{Action, ActionKind, ConflictWarning, Operation, Outcome, ReconciliationReport, UnifyReport};
pub use config::{IgnoreSources, ReconciliationOptions};
pub use error::{SyncError, Result};

/// Resolve and compile the ignore rules for `source`.
///
/// Fails with [`SyncError::NoIgnoreConfig`] when neither ignore file exists.
pub fn load_ignore_rules(
    source: impl AsRef<Path>,
    sources: &IgnoreSources,
    merge: bool,
) -> Result<IgnoreMatcher> {
    IgnoreMatcher::load(source, sources, merge)
}

/// Load the ignore rules, then mirror `source` into `mirror`
pub fn mirror_directories(
    source: impl AsRef<Path>,
    mirror: impl AsRef<Path>,
    sources: &IgnoreSources,
    options: ReconciliationOptions,
) -> Result<ReconciliationReport> {
    let matcher = load_ignore_rules(source.as_ref(), sources, options.merge_ignores)?;
    ReconciliationEngine::new(options).mirror(source, mirror, &matcher)
}

/// Remove mirror entries that no longer have a counterpart in `source`
pub fn prune_directories(
    source: impl AsRef<Path>,
    mirror: impl AsRef<Path>,
    options: ReconciliationOptions,
) -> Result<ReconciliationReport> {
    ReconciliationEngine::new(options).prune(source, mirror)
}

/// Load the ignore rules, then diff `source` against `mirror`
pub fn diff_directories(
    source: impl AsRef<Path>,
    mirror: impl AsRef<Path>,
    sources: &IgnoreSources,
    merge: bool,
) -> Result<DiffReport> {
    let matcher = load_ignore_rules(source.as_ref(), sources, merge)?;
    ReconciliationEngine::default().diff(source, mirror, &matcher)
}

/// Load the ignore rules, then run a forced mirror followed by a prune
pub fn unify_directories(
    source: impl AsRef<Path>,
    mirror: impl AsRef<Path>,
    sources: &IgnoreSources,
    options: ReconciliationOptions,
) -> Result<UnifyReport> {
    let matcher = load_ignore_rules(source.as_ref(), sources, options.merge_ignores)?;
    ReconciliationEngine::new(options).unify(source, mirror, &matcher)
}

// Engine tests compare inodes and need a unix filesystem
#[cfg(all(test, unix))]
mod test_support;

#[cfg(all(test, unix))]
mod conflict_tests;
