//! Read-only comparison of a source tree and its mirror

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::comparator::{Classification, ConflictKind, IdentityComparator};
use crate::error::Result;
use crate::filter::IgnoreMatcher;
use crate::report::display_relative;
use crate::scanner::{Entry, EntryKind, TreeWalker, WalkControl};

/// A relative path listed in a diff report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedPath {
    pub relative_path: PathBuf,
    pub kind: EntryKind,
}

impl ReportedPath {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            relative_path: entry.relative_path().to_path_buf(),
            kind: entry.kind(),
        }
    }

    /// Relative path with a trailing separator for directories
    pub fn display(&self) -> String {
        display_relative(&self.relative_path, self.kind)
    }
}

/// Differences between a source tree and its mirror, in walk order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Source entries (after filtering) that are absent from, or conflict
    /// with, the mirror
    pub missing: Vec<ReportedPath>,
    /// Mirror entries that are absent from the source, of a different kind
    /// there, or that the ignore rules filter out of it
    pub orphaned: Vec<ReportedPath>,
}

impl DiffReport {
    /// Whether the trees agree
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.orphaned.is_empty()
    }

    /// Relative paths missing from the mirror
    pub fn missing_paths(&self) -> Vec<&Path> {
        self.missing.iter().map(|p| p.relative_path.as_path()).collect()
    }

    /// Relative paths orphaned in the mirror
    pub fn orphaned_paths(&self) -> Vec<&Path> {
        self.orphaned.iter().map(|p| p.relative_path.as_path()).collect()
    }
}

/// Runs the two diff walks
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    walker: TreeWalker,
    comparator: IdentityComparator,
}

impl DiffEngine {
    /// Create a new diff engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `source` (filtered by `matcher`) with `mirror` (unfiltered)
    pub fn generate_report(
        &self,
        source: &Path,
        mirror: &Path,
        matcher: &IgnoreMatcher,
    ) -> Result<DiffReport> {
        let mut report = DiffReport::default();

        self.walker.walk(source, |entry| {
            if matcher.is_match(entry.relative_path(), entry.is_dir()) {
                return Ok(skip(entry));
            }

            match self.comparator.classify(entry, &entry.path_under(mirror))? {
                Classification::Missing | Classification::Conflict(_) => {
                    report.missing.push(ReportedPath::from_entry(entry));
                }
                Classification::IdenticalLink | Classification::DirectoryPresent => {}
            }
            Ok(WalkControl::Continue)
        })?;

        self.walker.walk(mirror, |entry| {
            let orphaned = matcher.is_excluded(entry.relative_path(), entry.is_dir())
                || matches!(
                    self.comparator.classify(entry, &entry.path_under(source))?,
                    Classification::Missing | Classification::Conflict(ConflictKind::KindMismatch)
                );

            if orphaned {
                report.orphaned.push(ReportedPath::from_entry(entry));
            }
            Ok(WalkControl::Continue)
        })?;

        tracing::info!(
            "diff finished: {} missing from mirror, {} orphaned in mirror",
            report.missing.len(),
            report.orphaned.len()
        );

        Ok(report)
    }
}

pub(crate) fn skip(entry: &Entry) -> WalkControl {
    tracing::debug!(
        "skipped {}: {}",
        if entry.is_dir() { "directory" } else { "file" },
        entry
    );
    if entry.is_dir() {
        WalkControl::SkipSubtree
    } else {
        WalkControl::Continue
    }
}
