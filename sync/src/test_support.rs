//! Scratch trees shared by the engine tests

use std::fs;
use std::path::{Path, PathBuf};
use rstest::fixture;
use tempfile::TempDir;

use crate::diff::ReportedPath;
use crate::filter::IgnoreMatcher;

/// A source tree and an (initially empty) mirror tree in one temp dir
pub struct Trees {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub mirror: PathBuf,
}

impl Trees {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let mirror = temp_dir.path().join("mirror");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&mirror).unwrap();
        Self {
            temp_dir,
            source,
            mirror,
        }
    }

    /// Write a source file, creating parent directories
    pub fn source_file(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.source.join(relative), content)
    }

    /// Write a mirror file, creating parent directories
    pub fn mirror_file(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.mirror.join(relative), content)
    }

    pub fn source_dir(&self, relative: &str) -> PathBuf {
        let path = self.source.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn mirror_dir(&self, relative: &str) -> PathBuf {
        let path = self.mirror.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Hard-link a source file into the mirror by hand
    pub fn link_into_mirror(&self, relative: &str) {
        let target = self.mirror.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::hard_link(self.source.join(relative), target).unwrap();
    }

    /// Matcher rooted at the source tree
    pub fn rules(&self, lines: &[&str]) -> IgnoreMatcher {
        IgnoreMatcher::from_lines(&self.source, lines).unwrap()
    }

    /// Whether the same relative path is one object in both trees
    pub fn is_linked(&self, relative: &str) -> bool {
        same_object(&self.source.join(relative), &self.mirror.join(relative))
    }

    /// Sorted relative paths of everything under the mirror
    pub fn mirror_listing(&self) -> Vec<String> {
        listing(&self.mirror)
    }
}

#[fixture]
pub fn trees() -> Trees {
    Trees::new()
}

pub fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

#[cfg(unix)]
pub fn same_object(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

/// Every path below `root`, relative, `/`-separated, sorted
pub fn listing(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(root).unwrap();
            let mut display = relative.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                display.push('/');
            }
            display
        })
        .collect();
    paths.sort();
    paths
}

/// Report items as `/`-separated strings, directories with a trailing `/`
pub fn displayed(paths: &[ReportedPath]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.display().replace('\\', "/"))
        .collect()
}
