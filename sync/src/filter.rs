//! Gitignore-style ignore rules using the ignore crate

use std::fmt;
use std::path::{Path, PathBuf};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};

use crate::config::IgnoreSources;
use crate::error::{Result, SyncError};

/// Which ignore file(s) a matcher was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreOrigin {
    /// The `.driveignore` inside the source tree
    Local,
    /// The per-user ignore file
    Global,
    /// Global rules followed by local rules
    Merged,
    /// Rules given directly as pattern lines
    Inline,
}

impl fmt::Display for IgnoreOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Merged => "merged global and local",
            Self::Inline => "inline",
        };
        f.write_str(name)
    }
}

/// Compiled ignore ruleset anchored at the root of the source tree.
///
/// Rules are evaluated gitignore style: the last matching pattern decides,
/// so a later `!pattern` re-includes what an earlier pattern excluded.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    root: PathBuf,
    rules: Gitignore,
    origin: IgnoreOrigin,
}

impl IgnoreMatcher {
    /// Resolve the ignore files for `root` and compile them.
    ///
    /// | local | global | merge | rules used              |
    /// |-------|--------|-------|-------------------------|
    /// | no    | no     | any   | error: `NoIgnoreConfig` |
    /// | yes   | no     | any   | local                   |
    /// | no    | yes    | any   | global                  |
    /// | yes   | yes    | no    | local                   |
    /// | yes   | yes    | yes   | global, then local      |
    pub fn load(root: impl AsRef<Path>, sources: &IgnoreSources, merge: bool) -> Result<Self> {
        let local = sources.local_exists().then_some(sources.local.as_path());
        let global = sources.existing_global();

        let (files, origin): (Vec<&Path>, IgnoreOrigin) = match (local, global) {
            (None, None) => {
                return Err(SyncError::NoIgnoreConfig {
                    local: sources.local.clone(),
                    global: sources.global.clone(),
                })
            }
            (Some(local), Some(global)) if merge => (vec![global, local], IgnoreOrigin::Merged),
            (Some(local), _) => (vec![local], IgnoreOrigin::Local),
            (None, Some(global)) => (vec![global], IgnoreOrigin::Global),
        };

        let root = normalize_root(root.as_ref());
        let mut builder = GitignoreBuilder::new(&root);
        for file in &files {
            if let Some(err) = builder.add(file) {
                return Err(SyncError::IgnoreRules {
                    path: file.to_path_buf(),
                    source: err,
                });
            }
        }

        let rules = builder.build().map_err(|e| SyncError::IgnoreRules {
            path: files.last().map(|p| p.to_path_buf()).unwrap_or_default(),
            source: e,
        })?;

        tracing::info!("loaded {} .driveignore ({} rules)", origin, rules.len());

        Ok(Self { root, rules, origin })
    }

    /// Compile pattern lines directly, in order.
    pub fn from_lines<I, S>(root: impl AsRef<Path>, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = normalize_root(root.as_ref());
        let mut builder = GitignoreBuilder::new(&root);
        for line in lines {
            builder
                .add_line(None, line.as_ref())
                .map_err(|e| SyncError::IgnoreRules {
                    path: root.clone(),
                    source: e,
                })?;
        }

        let rules = builder.build().map_err(|e| SyncError::IgnoreRules {
            path: root.clone(),
            source: e,
        })?;

        Ok(Self {
            root,
            rules,
            origin: IgnoreOrigin::Inline,
        })
    }

    /// Whether `path` itself is excluded by the rules.
    ///
    /// `path` may be relative to the ruleset root or absolute under it;
    /// absolute paths elsewhere never match. For a directory, `true` means
    /// the whole subtree should be skipped.
    pub fn is_match(&self, path: impl AsRef<Path>, is_dir: bool) -> bool {
        match self.relative(path.as_ref()) {
            Some(relative) if !relative.as_os_str().is_empty() => {
                self.rules.matched(relative, is_dir).is_ignore()
            }
            _ => false,
        }
    }

    /// Whether a walk of the root would skip `path`: the path itself or any
    /// of its ancestor directories is excluded.
    ///
    /// Ancestors are checked top-down as directories, the order a walk meets
    /// them. A `!pattern` below an excluded directory does not bring the
    /// path back, since the walk never reaches it.
    pub fn is_excluded(&self, path: impl AsRef<Path>, is_dir: bool) -> bool {
        let relative = match self.relative(path.as_ref()) {
            Some(relative) if !relative.as_os_str().is_empty() => relative,
            _ => return false,
        };

        let mut prefix = PathBuf::new();
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            prefix.push(component);
            let prefix_is_dir = components.peek().is_some() || is_dir;
            if self.rules.matched(&prefix, prefix_is_dir).is_ignore() {
                return true;
            }
        }
        false
    }

    /// Root the anchored patterns are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Which ignore file(s) the rules came from
    pub fn origin(&self) -> IgnoreOrigin {
        self.origin
    }

    /// Number of compiled patterns, negations included
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no patterns were compiled (an empty but present ignore file)
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        if path.is_absolute() {
            path.strip_prefix(&self.root).ok()
        } else {
            Some(path.strip_prefix(".").unwrap_or(path))
        }
    }
}

fn normalize_root(root: &Path) -> PathBuf {
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}
