//! Action logs and counts produced by mirror, prune and unify runs

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

use crate::comparator::ConflictKind;
use crate::scanner::{Entry, EntryKind};

/// Which algorithm produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Mirror,
    Prune,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mirror => f.write_str("mirror"),
            Self::Prune => f.write_str("prune"),
        }
    }
}

/// A mutation performed on (or, in a dry run, planned for) the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A directory was created in the mirror
    CreateDirectory,
    /// A source file was hard-linked into the mirror
    Link,
    /// A conflicting mirror entry was replaced (forced mirror)
    Overwrite,
    /// A mirror entry without a live counterpart was removed
    Remove,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CreateDirectory => "created directory",
            Self::Link => "created hard link",
            Self::Overwrite => "overwrote",
            Self::Remove => "removed",
        };
        f.write_str(label)
    }
}

/// One logged action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub relative_path: PathBuf,
    pub entry_kind: EntryKind,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, display_relative(&self.relative_path, self.entry_kind))
    }
}

/// Same relative path, different object, left untouched because `force` was off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictWarning {
    pub relative_path: PathBuf,
    pub entry_kind: EntryKind,
    pub conflict: ConflictKind,
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = display_relative(&self.relative_path, self.entry_kind);
        match self.conflict {
            ConflictKind::DifferentObject => write!(
                f,
                "cannot upload '{}': a file with the same name already exists",
                path
            ),
            ConflictKind::KindMismatch => write!(
                f,
                "cannot upload '{}': the mirror has a different kind of entry at that path",
                path
            ),
        }
    }
}

/// Whether a run finished cleanly or left conflicts behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Clean,
    CompletedWithWarnings,
}

/// Result of a mirror or prune run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub operation: Operation,
    pub dry_run: bool,
    pub actions: Vec<Action>,
    pub conflicts: Vec<ConflictWarning>,
    pub duration: Duration,
    #[serde(skip)]
    started: Option<Instant>,
}

impl ReconciliationReport {
    /// Start an empty report; the clock runs until [`Self::complete`]
    pub fn new(operation: Operation, dry_run: bool) -> Self {
        Self {
            operation,
            dry_run,
            actions: Vec::new(),
            conflicts: Vec::new(),
            duration: Duration::ZERO,
            started: Some(Instant::now()),
        }
    }

    pub(crate) fn record(&mut self, kind: ActionKind, entry: &Entry) {
        let action = Action {
            kind,
            relative_path: entry.relative_path().to_path_buf(),
            entry_kind: entry.kind(),
        };
        tracing::debug!(dry_run = self.dry_run, "{}", action);
        self.actions.push(action);
    }

    pub(crate) fn record_conflict(&mut self, entry: &Entry, conflict: ConflictKind) {
        let warning = ConflictWarning {
            relative_path: entry.relative_path().to_path_buf(),
            entry_kind: entry.kind(),
            conflict,
        };
        tracing::warn!("{}", warning);
        self.conflicts.push(warning);
    }

    pub(crate) fn complete(mut self) -> Self {
        if let Some(started) = self.started.take() {
            self.duration = started.elapsed();
        }
        tracing::info!("{}", self.summary());
        self
    }

    /// Number of actions of one kind
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    /// Entries created in the mirror: new directories, links and overwrites
    pub fn created(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.kind != ActionKind::Remove)
            .count()
    }

    /// Entries removed from the mirror
    pub fn removed(&self) -> usize {
        self.count(ActionKind::Remove)
    }

    /// Every mutation, planned or performed
    pub fn mutation_count(&self) -> usize {
        self.actions.len()
    }

    /// Whether any conflict was skipped
    pub fn has_warnings(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Clean or completed with warnings
    pub fn outcome(&self) -> Outcome {
        if self.has_warnings() {
            Outcome::CompletedWithWarnings
        } else {
            Outcome::Clean
        }
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        let prefix = if self.dry_run { "dry run: " } else { "" };
        match self.operation {
            Operation::Mirror => format!(
                "{}{} finished in {:.2}s: {} directories created, {} links created, {} overwritten, {} conflicts",
                prefix,
                self.operation,
                self.duration.as_secs_f64(),
                self.count(ActionKind::CreateDirectory),
                self.count(ActionKind::Link),
                self.count(ActionKind::Overwrite),
                self.conflicts.len(),
            ),
            Operation::Prune => format!(
                "{}{} finished in {:.2}s: {} entries removed",
                prefix,
                self.operation,
                self.duration.as_secs_f64(),
                self.removed(),
            ),
        }
    }
}

/// Reports of the two phases of a unify run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifyReport {
    pub mirror: ReconciliationReport,
    pub prune: ReconciliationReport,
}

impl UnifyReport {
    /// Mutations across both phases
    pub fn mutation_count(&self) -> usize {
        self.mirror.mutation_count() + self.prune.mutation_count()
    }
}

/// Relative path with a trailing separator for directories
pub fn display_relative(path: &Path, kind: EntryKind) -> String {
    if kind.is_dir() {
        format!("{}{}", path.display(), std::path::MAIN_SEPARATOR)
    } else {
        path.display().to_string()
    }
}
