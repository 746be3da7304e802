//! compindex CLI
//!
//! Builds or incrementally updates the component index of a project.

use anyhow::{Context, Result};
use clap::Parser;
use compindex_indexer::{
    IndexConfig, IndexOptions, IndexSnapshot, Indexer, RunKind, RunOutcome, ScanMode,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compindex")]
#[command(about = "Structural index of a component-based UI source tree")]
#[command(version)]
struct Cli {
    /// Project root (default: nearest ancestor with .git or .compindex.yaml)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output file, relative to the current directory (default: docs/component-index.json under the project root)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only index roots with this generation label
    #[arg(long, value_name = "LABEL")]
    only_generation: Option<String>,

    /// Re-index only files changed since REF
    #[arg(long, value_name = "REF", num_args = 0..=1, default_missing_value = "HEAD")]
    git_changes: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let project_root = match cli.root {
        Some(root) => resolve_from(&cwd, root),
        None => find_project_root(&cwd),
    };

    let config = IndexConfig::load(&project_root, cli.config.as_deref())
        .context("Failed to load configuration")?;

    let options = IndexOptions {
        project_root: project_root.clone(),
        output: cli.output.map(|output| resolve_from(&cwd, output)),
        mode: match cli.git_changes {
            Some(base_ref) => ScanMode::Incremental { base_ref },
            None => ScanMode::Full,
        },
        only_generation: cli.only_generation,
    };

    let outcome = Indexer::new(config, options)
        .run()
        .await
        .with_context(|| format!("Failed to index {}", project_root.display()))?;

    match outcome {
        RunOutcome::UpToDate { .. } => {
            println!("No component changes detected. Index is up to date.");
        }
        RunOutcome::Rebuilt(report) => {
            if let RunKind::Incremental { reindexed, deleted } = report.kind {
                println!(
                    "Incremental update: +{} re-indexed, -{} deleted, {} total",
                    reindexed, deleted, report.snapshot.stats.total
                );
            }
            print_summary(&report.output, &report.snapshot);
            if report.skipped > 0 {
                println!("  Skipped: {} files without a component", report.skipped);
            }
        }
    }

    Ok(())
}

/// Nearest ancestor of `start` holding `.git` or a project config, else `start`.
fn find_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists() || dir.join(".compindex.yaml").exists())
        .unwrap_or(start)
        .to_path_buf()
}

/// Command-line paths are relative to the invocation directory.
fn resolve_from(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn print_summary(output: &Path, snapshot: &IndexSnapshot) {
    let stats = &snapshot.stats;

    println!("Component index generated: {}", output.display());

    let versions: Vec<String> = stats
        .by_version
        .iter()
        .rev()
        .map(|(version, count)| format!("{version}: {count}"))
        .collect();
    println!(
        "  Total: {} components ({})",
        stats.total,
        versions.join(", ")
    );

    let mut layers: Vec<(&String, &usize)> = stats.by_layer.iter().collect();
    layers.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let layers: Vec<String> = layers
        .into_iter()
        .map(|(layer, count)| format!("{layer}: {count}"))
        .collect();
    println!("  Layers: {}", layers.join(", "));

    println!(
        "  With routes: {}, With style root: {}, With store: {}",
        stats.with_routes, stats.with_style_root, stats.with_store
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_git_changes() {
        let cli = Cli::parse_from(["compindex", "--git-changes"]);
        assert_eq!(cli.git_changes.as_deref(), Some("HEAD"));

        let cli = Cli::parse_from(["compindex", "--git-changes", "main"]);
        assert_eq!(cli.git_changes.as_deref(), Some("main"));

        let cli = Cli::parse_from(["compindex", "--only-generation", "v2", "-v"]);
        assert_eq!(cli.git_changes, None);
        assert_eq!(cli.only_generation.as_deref(), Some("v2"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_relative_paths_resolve_against_cwd() {
        let cwd = Path::new("/work/project/src/app");
        assert_eq!(
            resolve_from(cwd, PathBuf::from("out/index.json")),
            PathBuf::from("/work/project/src/app/out/index.json")
        );
        assert_eq!(
            resolve_from(cwd, PathBuf::from("/tmp/index.json")),
            PathBuf::from("/tmp/index.json")
        );
    }

    #[test]
    fn test_find_project_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp_dir.path().join("a/.compindex.yaml"), "").unwrap();

        assert_eq!(find_project_root(&nested), temp_dir.path().join("a"));
    }
}
