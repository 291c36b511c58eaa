use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use driveignore_sync::config::{ensure_global_ignore_file, global_ignore_path};
use driveignore_sync::{
    diff_directories, mirror_directories, prune_directories, unify_directories, DiffReport,
    IgnoreSources, ReconciliationOptions, ReconciliationReport,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "driveignore")]
#[command(about = "Mirror a directory into a drive folder with hard links, filtered by .driveignore")]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hard-link the source tree into the mirror
    Upload {
        /// Mirror directory
        mirror: PathBuf,
        /// Source directory
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        /// Use both the global and the local ignore file
        #[arg(short = 'M', long)]
        merge_ignores: bool,
        /// Replace mirror files that clash with source files
        #[arg(long)]
        force: bool,
        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove mirror entries that are gone from the source
    Clean {
        /// Mirror directory
        mirror: PathBuf,
        /// Source directory
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Show what is missing from, and orphaned in, the mirror
    Diff {
        /// Mirror directory
        mirror: PathBuf,
        /// Source directory
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        /// Use both the global and the local ignore file
        #[arg(short = 'M', long)]
        merge_ignores: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forced upload followed by clean
    Unify {
        /// Mirror directory
        mirror: PathBuf,
        /// Source directory
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
        /// Use both the global and the local ignore file
        #[arg(short = 'M', long)]
        merge_ignores: bool,
        /// Only report what would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Locate (and create if needed) the global ignore file
    Global {
        /// Print the file's content instead of its path
        #[arg(long)]
        show: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so diff output on stdout stays pipeable
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Upload {
            mirror,
            input,
            merge_ignores,
            force,
            dry_run,
        } => {
            let options = ReconciliationOptions {
                force,
                merge_ignores,
                dry_run,
            };
            let report = mirror_directories(&input, &mirror, &IgnoreSources::discover(&input), options)
                .with_context(|| format!("failed to upload '{}'", input.display()))?;
            print_report(&report);
        }
        Commands::Clean {
            mirror,
            input,
            dry_run,
        } => {
            let options = ReconciliationOptions {
                dry_run,
                ..Default::default()
            };
            let report = prune_directories(&input, &mirror, options)
                .with_context(|| format!("failed to clean '{}'", mirror.display()))?;
            print_report(&report);
        }
        Commands::Diff {
            mirror,
            input,
            merge_ignores,
            json,
        } => {
            let report =
                diff_directories(&input, &mirror, &IgnoreSources::discover(&input), merge_ignores)
                    .with_context(|| {
                        format!("failed to diff '{}' against '{}'", input.display(), mirror.display())
                    })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_diff(&report);
            }
        }
        Commands::Unify {
            mirror,
            input,
            merge_ignores,
            dry_run,
        } => {
            let options = ReconciliationOptions {
                force: true,
                merge_ignores,
                dry_run,
            };
            let report = unify_directories(&input, &mirror, &IgnoreSources::discover(&input), options)
                .with_context(|| format!("failed to unify '{}'", mirror.display()))?;
            print_report(&report.mirror);
            print_report(&report.prune);
        }
        Commands::Global { show } => {
            let path = global_ignore_path()?;
            show_global(&path, show)?;
        }
    }

    Ok(())
}

fn show_global(path: &Path, show: bool) -> Result<()> {
    if ensure_global_ignore_file(path)? {
        info!("created empty global ignore file");
    }

    if show {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        print!("{}", content);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn print_report(report: &ReconciliationReport) {
    for conflict in &report.conflicts {
        println!("{} {}", "WARN".yellow().bold(), conflict);
    }
    println!("{}", report.summary());
}

fn print_diff(report: &DiffReport) {
    if report.is_empty() {
        println!("{}", "mirror is up to date".green());
        return;
    }

    if !report.missing.is_empty() {
        println!("{}", "missing from mirror:".bold());
        for path in &report.missing {
            println!("  {}", path.display().as_str().red());
        }
    }
    if !report.orphaned.is_empty() {
        println!("{}", "orphaned in mirror:".bold());
        for path in &report.orphaned {
            println!("  {}", path.display().as_str().yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upload_flags() {
        let cli = Cli::try_parse_from(["driveignore", "upload", "/drive", "-i", "/src", "-M", "--force"])
            .unwrap();

        match cli.command {
            Commands::Upload {
                mirror,
                input,
                merge_ignores,
                force,
                dry_run,
            } => {
                assert_eq!(mirror, PathBuf::from("/drive"));
                assert_eq!(input, PathBuf::from("/src"));
                assert!(merge_ignores);
                assert!(force);
                assert!(!dry_run);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_input_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["driveignore", "-v", "clean", "/drive"]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Clean { input, .. } => assert_eq!(input, PathBuf::from(".")),
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn test_clean_has_no_force_flag() {
        assert!(Cli::try_parse_from(["driveignore", "clean", "/drive", "--force"]).is_err());
    }

    #[test]
    fn test_mirror_argument_is_required() {
        assert!(Cli::try_parse_from(["driveignore", "diff"]).is_err());
    }

    #[test]
    fn test_global_file_is_created_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("driveignore").join(".global_driveignore");

        show_global(&path, false).unwrap();
        assert!(path.is_file());

        fs::write(&path, "*.tmp\n").unwrap();
        show_global(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "*.tmp\n");
    }
}
