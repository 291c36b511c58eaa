//! Mirror, prune and unify: the mutating reconciliation algorithms

use std::fs;
use std::path::{Path, PathBuf};

use crate::comparator::{Classification, ConflictKind, IdentityComparator};
use crate::config::ReconciliationOptions;
use crate::diff::{self, DiffEngine, DiffReport};
use crate::error::{Result, SyncError};
use crate::filter::IgnoreMatcher;
use crate::report::{ActionKind, Operation, ReconciliationReport, UnifyReport};
use crate::scanner::{self, Entry, TreeWalker, WalkControl};

/// Reconciles a source tree with its hard-linked mirror
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    options: ReconciliationOptions,
    walker: TreeWalker,
    comparator: IdentityComparator,
    diff_engine: DiffEngine,
}

impl ReconciliationEngine {
    /// Create a new engine with options
    pub fn new(options: ReconciliationOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Engine options
    pub fn options(&self) -> &ReconciliationOptions {
        &self.options
    }

    /// Hard-link every source entry the rules keep into `mirror`.
    ///
    /// Excluded directories are skipped with their whole subtree. Same-path
    /// entries that are different objects are replaced when `force` is set
    /// and reported as conflicts otherwise.
    pub fn mirror(
        &self,
        source: impl AsRef<Path>,
        mirror: impl AsRef<Path>,
        matcher: &IgnoreMatcher,
    ) -> Result<ReconciliationReport> {
        let (source, mirror) = resolve_disjoint_roots(source.as_ref(), mirror.as_ref())?;

        tracing::info!(
            force = self.options.force,
            dry_run = self.options.dry_run,
            "mirroring '{}' into '{}'",
            source.display(),
            mirror.display()
        );
        if self.options.force {
            tracing::info!("using force, conflicting mirror files will be overwritten");
        }

        let mut report = ReconciliationReport::new(Operation::Mirror, self.options.dry_run);

        self.walker.walk(&source, |entry| {
            if matcher.is_match(entry.relative_path(), entry.is_dir()) {
                return Ok(diff::skip(entry));
            }

            let target = entry.path_under(&mirror);
            match self.comparator.classify(entry, &target)? {
                Classification::Missing => {
                    self.materialize(entry, &target)?;
                    report.record(missing_action(entry), entry);
                }
                Classification::IdenticalLink | Classification::DirectoryPresent => {}
                Classification::Conflict(conflict) if self.options.force => {
                    self.remove(&target, conflict)?;
                    self.materialize(entry, &target)?;
                    report.record(ActionKind::Overwrite, entry);
                }
                Classification::Conflict(conflict) => {
                    report.record_conflict(entry, conflict);
                    if entry.is_dir() {
                        return Ok(WalkControl::SkipSubtree);
                    }
                }
            }
            Ok(WalkControl::Continue)
        })?;

        Ok(report.complete())
    }

    /// Remove every mirror entry that has no live counterpart in `source`.
    ///
    /// Ignore rules are not consulted: an entry survives as long as the same
    /// object (or, for directories, a directory) exists at its path in the
    /// source.
    pub fn prune(
        &self,
        source: impl AsRef<Path>,
        mirror: impl AsRef<Path>,
    ) -> Result<ReconciliationReport> {
        let (source, mirror) = resolve_disjoint_roots(source.as_ref(), mirror.as_ref())?;

        tracing::info!(
            dry_run = self.options.dry_run,
            "pruning '{}' against '{}'",
            mirror.display(),
            source.display()
        );

        let mut report = ReconciliationReport::new(Operation::Prune, self.options.dry_run);

        self.walker.walk(&mirror, |entry| {
            let stale = !self
                .comparator
                .classify(entry, &entry.path_under(&source))?
                .is_in_sync();

            if !stale {
                return Ok(WalkControl::Continue);
            }

            if !self.options.dry_run {
                remove_entry(entry)?;
            }
            report.record(ActionKind::Remove, entry);

            if entry.is_dir() {
                Ok(WalkControl::SkipSubtree)
            } else {
                Ok(WalkControl::Continue)
            }
        })?;

        Ok(report.complete())
    }

    /// Report differences without touching either tree
    pub fn diff(
        &self,
        source: impl AsRef<Path>,
        mirror: impl AsRef<Path>,
        matcher: &IgnoreMatcher,
    ) -> Result<DiffReport> {
        self.diff_engine
            .generate_report(source.as_ref(), mirror.as_ref(), matcher)
    }

    /// Forced mirror followed by prune
    pub fn unify(
        &self,
        source: impl AsRef<Path>,
        mirror: impl AsRef<Path>,
        matcher: &IgnoreMatcher,
    ) -> Result<UnifyReport> {
        let forced = Self::new(self.options.clone().forced());
        let mirror_report = forced.mirror(source.as_ref(), mirror.as_ref(), matcher)?;
        let prune_report = forced.prune(source.as_ref(), mirror.as_ref())?;

        Ok(UnifyReport {
            mirror: mirror_report,
            prune: prune_report,
        })
    }

    /// Create the directory, or hard-link the file, at `target`
    fn materialize(&self, entry: &Entry, target: &Path) -> Result<()> {
        if self.options.dry_run {
            return Ok(());
        }

        if entry.is_dir() {
            return fs::create_dir_all(target).map_err(|e| SyncError::create_dir_error(target, e));
        }
        link_file(entry.path(), target)
    }

    /// Clear a conflicting mirror entry before it is replaced
    fn remove(&self, target: &Path, conflict: ConflictKind) -> Result<()> {
        if self.options.dry_run {
            return Ok(());
        }

        tracing::debug!("overwriting '{}' ({:?})", target.display(), conflict);
        let metadata =
            fs::symlink_metadata(target).map_err(|e| SyncError::stat_error(target, e))?;
        let result = if metadata.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        result.map_err(|e| SyncError::removal_error(target, e))
    }
}

/// Resolve both roots and refuse trees nested in one another.
///
/// A mirror inside the source would be walked while it grows, and a source
/// inside the mirror would be pruned away.
fn resolve_disjoint_roots(source: &Path, mirror: &Path) -> Result<(PathBuf, PathBuf)> {
    let source = scanner::resolve_root(source)?;
    let mirror = scanner::resolve_root(mirror)?;

    let canonical = |root: &Path| {
        fs::canonicalize(root).map_err(|e| {
            SyncError::invalid_root(root, format!("cannot resolve path: {}", e))
        })
    };
    let (canonical_source, canonical_mirror) = (canonical(&source)?, canonical(&mirror)?);

    if canonical_mirror.starts_with(&canonical_source)
        || canonical_source.starts_with(&canonical_mirror)
    {
        return Err(SyncError::invalid_root(
            &mirror,
            format!("overlaps the source tree '{}'", source.display()),
        ));
    }

    Ok((source, mirror))
}

/// Hard-link `source` at `target`, creating the parent directories first
fn link_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::create_dir_error(parent, e))?;
    }
    fs::hard_link(source, target).map_err(|e| SyncError::link_error(source, target, e))
}

fn missing_action(entry: &Entry) -> ActionKind {
    if entry.is_dir() {
        ActionKind::CreateDirectory
    } else {
        ActionKind::Link
    }
}

fn remove_entry(entry: &Entry) -> Result<()> {
    let result = if entry.is_dir() {
        fs::remove_dir_all(entry.path())
    } else {
        fs::remove_file(entry.path())
    };
    result.map_err(|e| SyncError::removal_error(entry.path(), e))
}
