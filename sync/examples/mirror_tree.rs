//! Mirror a small scratch tree, break one link, then diff, prune and unify

use std::error::Error;
use std::fs;
use driveignore_sync::{IgnoreMatcher, ReconciliationEngine, ReconciliationOptions};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let temp_dir = tempfile::TempDir::new()?;
    let source = temp_dir.path().join("source");
    let mirror = temp_dir.path().join("drive");

    fs::create_dir_all(source.join("notes"))?;
    fs::create_dir_all(source.join("target/debug"))?;
    fs::create_dir_all(&mirror)?;
    fs::write(source.join("notes/todo.md"), "- water plants\n")?;
    fs::write(source.join("notes/scratch.tmp"), "scratch")?;
    fs::write(source.join("target/debug/app"), "binary")?;
    fs::write(source.join("README.md"), "hello\n")?;

    let matcher = IgnoreMatcher::from_lines(&source, ["*.tmp", "/target/"])?;
    println!("{} rules from {}", matcher.len(), matcher.origin());

    let engine = ReconciliationEngine::default();
    let report = engine.mirror(&source, &mirror, &matcher)?;
    println!("{}", report.summary());
    for action in &report.actions {
        println!("  {}", action);
    }

    // Replace one mirrored file with an unrelated copy and leave an orphan
    fs::remove_file(mirror.join("README.md"))?;
    fs::write(mirror.join("README.md"), "hello\n")?;
    fs::write(mirror.join("old.txt"), "stale")?;

    let diff = engine.diff(&source, &mirror, &matcher)?;
    for path in &diff.missing {
        println!("missing:  {}", path.display());
    }
    for path in &diff.orphaned {
        println!("orphaned: {}", path.display());
    }

    let report = engine.mirror(&source, &mirror, &matcher)?;
    for conflict in &report.conflicts {
        println!("warning: {}", conflict);
    }

    let unified = ReconciliationEngine::new(ReconciliationOptions::default())
        .unify(&source, &mirror, &matcher)?;
    println!("{}", unified.mirror.summary());
    println!("{}", unified.prune.summary());
    println!("in sync: {}", engine.diff(&source, &mirror, &matcher)?.is_empty());

    Ok(())
}
