//! Tests for same-path clashes between the source and the mirror

use super::*;
use crate::test_support::{trees, Trees};
use std::fs;
use rstest::*;

fn forced() -> ReconciliationEngine {
    ReconciliationEngine::new(ReconciliationOptions::default().forced())
}

mod different_object_tests {
    use super::*;

    #[rstest]
    fn test_unforced_mirror_keeps_unrelated_file(trees: Trees) {
        trees.source_file("x.txt", "source content");
        trees.mirror_file("x.txt", "unrelated");

        let report = ReconciliationEngine::default()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.outcome(), Outcome::CompletedWithWarnings);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict, ConflictKind::DifferentObject);
        assert_eq!(
            report.conflicts[0].to_string(),
            "cannot upload 'x.txt': a file with the same name already exists"
        );
        assert_eq!(report.mutation_count(), 0);
        assert_eq!(fs::read_to_string(trees.mirror.join("x.txt")).unwrap(), "unrelated");
        assert!(!trees.is_linked("x.txt"));
    }

    #[rstest]
    fn test_forced_mirror_relinks(trees: Trees) {
        trees.source_file("x.txt", "source content");
        trees.mirror_file("x.txt", "unrelated");

        let report = forced()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.outcome(), Outcome::Clean);
        assert_eq!(report.count(ActionKind::Overwrite), 1);
        assert!(trees.is_linked("x.txt"));
        assert_eq!(
            fs::read_to_string(trees.mirror.join("x.txt")).unwrap(),
            "source content"
        );
    }

    #[rstest]
    fn test_walk_continues_after_conflict(trees: Trees) {
        trees.source_file("a.txt", "a");
        trees.source_file("b.txt", "b");
        trees.source_file("c/d.txt", "d");
        trees.mirror_file("a.txt", "other");

        let report = ReconciliationEngine::default()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.conflicts.len(), 1);
        assert!(trees.is_linked("b.txt"));
        assert!(trees.is_linked("c/d.txt"));
    }

    #[rstest]
    fn test_dry_run_forced_overwrite_leaves_file(trees: Trees) {
        trees.source_file("x.txt", "source content");
        trees.mirror_file("x.txt", "unrelated");

        let engine = ReconciliationEngine::new(ReconciliationOptions {
            force: true,
            dry_run: true,
            ..Default::default()
        });
        let report = engine
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.count(ActionKind::Overwrite), 1);
        assert_eq!(fs::read_to_string(trees.mirror.join("x.txt")).unwrap(), "unrelated");
    }

    #[rstest]
    fn test_prune_removes_conflicting_mirror_file(trees: Trees) {
        trees.source_file("x.txt", "source content");
        trees.mirror_file("x.txt", "unrelated");

        let report = ReconciliationEngine::default()
            .prune(&trees.source, &trees.mirror)
            .unwrap();

        assert_eq!(report.removed(), 1);
        assert!(!trees.mirror.join("x.txt").exists());
        assert!(trees.source.join("x.txt").exists());
    }
}

mod kind_mismatch_tests {
    use super::*;

    #[rstest]
    fn test_source_directory_over_mirror_file(trees: Trees) {
        trees.source_file("thing/inner.txt", "i");
        trees.mirror_file("thing", "a plain file");

        let report = ReconciliationEngine::default()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict, ConflictKind::KindMismatch);
        assert_eq!(report.conflicts[0].entry_kind, EntryKind::Directory);
        assert!(trees.mirror.join("thing").is_file());
        assert_eq!(report.mutation_count(), 0);
    }

    #[rstest]
    fn test_source_file_over_mirror_directory(trees: Trees) {
        trees.source_file("thing", "a plain file");
        trees.mirror_file("thing/inner.txt", "i");

        let report = ReconciliationEngine::default()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].conflict, ConflictKind::KindMismatch);
        assert!(trees.mirror.join("thing/inner.txt").is_file());
    }

    #[rstest]
    fn test_forced_directory_replaces_mirror_file(trees: Trees) {
        trees.source_file("thing/inner.txt", "i");
        trees.mirror_file("thing", "a plain file");

        let report = forced()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.count(ActionKind::Overwrite), 1);
        assert!(trees.mirror.join("thing").is_dir());
        assert!(trees.is_linked("thing/inner.txt"));
    }

    #[rstest]
    fn test_forced_file_replaces_mirror_directory(trees: Trees) {
        trees.source_file("thing", "a plain file");
        trees.mirror_file("thing/inner.txt", "i");

        let report = forced()
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();

        assert_eq!(report.count(ActionKind::Overwrite), 1);
        assert!(trees.is_linked("thing"));
        assert_eq!(trees.mirror_listing(), vec!["thing"]);
    }

    #[rstest]
    fn test_prune_removes_directory_shadowing_source_file(trees: Trees) {
        trees.source_file("thing", "a plain file");
        trees.mirror_file("thing/inner.txt", "i");
        let engine = ReconciliationEngine::default();

        let report = engine.prune(&trees.source, &trees.mirror).unwrap();

        assert_eq!(report.removed(), 1);
        assert_eq!(report.actions[0].entry_kind, EntryKind::Directory);
        assert!(trees.mirror_listing().is_empty());

        let mirrored = engine
            .mirror(&trees.source, &trees.mirror, &trees.rules(&[]))
            .unwrap();
        assert!(!mirrored.has_warnings());
        assert!(trees.is_linked("thing"));
    }

    #[rstest]
    fn test_prune_removes_file_shadowing_source_directory(trees: Trees) {
        trees.source_file("thing/inner.txt", "i");
        trees.mirror_file("thing", "a plain file");

        let report = ReconciliationEngine::default()
            .prune(&trees.source, &trees.mirror)
            .unwrap();

        assert_eq!(report.removed(), 1);
        assert!(trees.mirror_listing().is_empty());
    }
}
