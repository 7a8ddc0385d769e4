//! # Snapvault CLI
//!
//! Command-line interface for the snapvault snapshot library.
//!
//! ## Usage
//! ```bash
//! # Capture a snapshot of a directory
//! snapvault snapshot ./project ./snapshots
//!
//! # List snapshots
//! snapvault list ./snapshots
//!
//! # Restore a snapshot
//! snapvault restore <snapshot-id> ./snapshots ./restored
//!
//! # Prune (delete) a snapshot and reclaim its content
//! snapvault prune ./snapshots <snapshot-id>
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use snapvault::utils::format_bytes;
use snapvault::{
    ContentStore, Pruner, Restorer, Result, SnapshotBuilder, SnapshotRepository, TIMESTAMP_FORMAT,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Snapvault CLI - content-addressed, deduplicated directory snapshots
#[derive(Parser)]
#[command(name = "snapvault")]
#[command(version)]
#[command(about = "Capture, list, restore and prune deduplicated directory snapshots")]
struct Cli {
    /// Content store file (defaults to storage/hash_map.json)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a snapshot of a directory and save it
    Snapshot {
        /// Directory to capture
        target_dir: PathBuf,

        /// Directory where the snapshot record is written
        output_dir: PathBuf,
    },

    /// List snapshots in a directory
    #[command(alias = "ls")]
    List {
        /// Directory containing snapshot records
        dir: PathBuf,
    },

    /// Restore a snapshot into an output directory
    Restore {
        /// Snapshot ID
        snapshot_id: String,

        /// Directory containing snapshot records
        snapshots_dir: PathBuf,

        /// Directory to restore into
        output_dir: PathBuf,
    },

    /// Prune (delete) a snapshot and reclaim unreferenced content
    Prune {
        /// Directory containing snapshot records
        dir: PathBuf,

        /// Snapshot ID to remove
        snapshot_id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let store = cli
        .store
        .map(ContentStore::new)
        .unwrap_or_default();

    if let Err(e) = run(cli.command, store) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(command: Commands, store: ContentStore) -> Result<()> {
    match command {
        Commands::Snapshot { target_dir, output_dir } => cmd_snapshot(store, target_dir, output_dir),
        Commands::List { dir } => cmd_list(store, dir),
        Commands::Restore { snapshot_id, snapshots_dir, output_dir } => {
            cmd_restore(store, snapshot_id, snapshots_dir, output_dir)
        }
        Commands::Prune { dir, snapshot_id } => cmd_prune(store, dir, snapshot_id),
    }
}

/// Capture a snapshot and persist it
fn cmd_snapshot(store: ContentStore, target_dir: PathBuf, output_dir: PathBuf) -> Result<()> {
    println!("{}", "Creating snapshot...".blue().bold());

    let builder = SnapshotBuilder::new(store.clone());
    let Some(snapshot) = builder.create(&target_dir)? else {
        println!("{}", "No changes detected; no snapshot created.".yellow());
        return Ok(());
    };

    let repository = SnapshotRepository::new(store);
    let record_path = repository.save(&snapshot, &output_dir)?;

    println!(
        "{} Created snapshot {}",
        "✓".green().bold(),
        snapshot.short_id().yellow().bold()
    );
    println!("  Saved to: {}", record_path.display().to_string().cyan());
    println!("  New files: {}", snapshot.files.len().to_string().cyan());
    println!(
        "  Snapshot size (unique content): {}",
        format_bytes(snapshot.snapshot_size).cyan()
    );
    println!("  Directory size: {}", format_bytes(snapshot.directory_size).cyan());

    Ok(())
}

/// List snapshots, ascending by timestamp
fn cmd_list(store: ContentStore, dir: PathBuf) -> Result<()> {
    let repository = SnapshotRepository::new(store);
    let snapshots = repository.list(&dir)?;

    if snapshots.is_empty() {
        println!("{}", "No snapshots found.".yellow());
        return Ok(());
    }

    // plain strings: pad widths and ANSI color codes do not mix
    println!(
        "{:<7}{:<38}{:<21}{:<17}{}",
        "INDEX", "SNAPSHOT ID", "TIMESTAMP", "DIRECTORY_SIZE", "SNAPSHOT_SIZE"
    );

    for (index, snapshot) in snapshots.iter().enumerate() {
        println!(
            "{:<7}{:<38}{:<21}{:<17}{}",
            index + 1,
            snapshot.id,
            snapshot.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format_bytes(snapshot.directory_size),
            format_bytes(snapshot.snapshot_size)
        );
    }

    Ok(())
}

/// Restore a snapshot into an output directory
fn cmd_restore(
    store: ContentStore,
    snapshot_id: String,
    snapshots_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    println!(
        "{} {}",
        "Restoring snapshot".blue().bold(),
        snapshot_id.yellow()
    );

    let restorer = Restorer::new(store);
    let report = restorer.restore(&snapshot_id, &snapshots_dir, &output_dir)?;

    println!("{} Restoration complete", "✓".green().bold());
    println!("  Files restored: {}", report.files_restored.to_string().cyan());
    println!("  Files unchanged: {}", report.files_unchanged.to_string().cyan());
    if report.files_skipped > 0 {
        println!(
            "  Files skipped (content missing from store): {}",
            report.files_skipped.to_string().yellow()
        );
    }

    Ok(())
}

/// Prune a snapshot and reclaim unreferenced content
fn cmd_prune(store: ContentStore, dir: PathBuf, snapshot_id: String) -> Result<()> {
    println!("{} {}", "Pruning snapshot".blue().bold(), snapshot_id.yellow());

    let pruner = Pruner::new(store);
    let report = pruner.prune(&dir, &snapshot_id)?;

    println!("{} Pruned snapshot {}", "✓".green().bold(), report.snapshot_id.yellow());
    println!("  Hashes released: {}", report.hashes_released.to_string().cyan());
    println!(
        "  Content entries removed from store: {}",
        report.hashes_removed.to_string().cyan()
    );

    Ok(())
}
