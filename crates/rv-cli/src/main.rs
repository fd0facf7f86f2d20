//! Revisit CLI
//!
//! Developer tool for working with exported extension storage files and
//! whitelist pattern lists outside the browser.

mod store;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use rv_core::{
    filter::validate_pattern, Ack, Command, HistoryStore, Matcher, NavigationTrigger,
    PatternValidation, Storage, SystemClock, Tracker,
};
use store::JsonFileStorage;

#[derive(Parser)]
#[command(name = "rv-cli")]
#[command(about = "Revisit whitelist and visit-history tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a URL against a whitelist pattern file (one pattern per line)
    Check {
        /// Pattern file
        #[arg(short, long)]
        filters: PathBuf,

        /// URL to test
        url: String,
    },

    /// Simulate a tracked navigation against a storage file
    Visit {
        /// Exported storage JSON file
        #[arg(short, long)]
        store: PathBuf,

        /// URL being visited
        url: String,
    },

    /// Prune history entries that no longer match the stored whitelist
    Cleanup {
        /// Exported storage JSON file
        #[arg(short, long)]
        store: PathBuf,
    },

    /// List visit-history entries
    History {
        /// Exported storage JSON file
        #[arg(short, long)]
        store: PathBuf,
    },

    /// Write TypeScript definitions for the message protocol
    ExportTypes {
        /// Output directory
        #[arg(short, long, default_value = "types")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { filters, url } => cmd_check(&filters, &url),
        Commands::Visit { store, url } => cmd_visit(&store, &url).await,
        Commands::Cleanup { store } => cmd_cleanup(&store).await,
        Commands::History { store } => cmd_history(&store).await,
        Commands::ExportTypes { output } => cmd_export_types(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_patterns(path: &PathBuf) -> Result<Vec<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn cmd_check(filters: &PathBuf, url: &str) -> Result<(), String> {
    let patterns = read_patterns(filters)?;

    for pattern in &patterns {
        if let PatternValidation::Invalid { pattern, error } = validate_pattern(pattern) {
            println!("  invalid (skipped): {pattern}  [{error}]");
        }
    }

    let matcher = Matcher::compile(&patterns);
    println!(
        "Whitelist: {} usable pattern(s), {} dropped",
        matcher.len(),
        matcher.dropped()
    );

    if matcher.is_match(url) {
        println!("MATCH     {url}");
    } else {
        println!("no match  {url}");
    }
    Ok(())
}

async fn cmd_visit(store: &PathBuf, url: &str) -> Result<(), String> {
    let storage = JsonFileStorage::new(store);
    let mut tracker = Tracker::new(storage);

    let op = tracker
        .handle_navigation(NavigationTrigger::PageTeardown, url)
        .await
        .map_err(|e| e.to_string())?;

    match op {
        rv_core::BannerOp::Insert { text } | rv_core::BannerOp::SetText { text } => {
            println!("Tracked. Banner would show: {text}");
        }
        rv_core::BannerOp::Remove | rv_core::BannerOp::Keep => {
            println!("Not tracked (URL does not match the stored whitelist).");
        }
    }
    Ok(())
}

async fn cmd_cleanup(store: &PathBuf) -> Result<(), String> {
    let storage = JsonFileStorage::new(store);
    let clock = SystemClock;

    let filters = storage
        .load_filters()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    let stats = HistoryStore::new(&storage, &clock)
        .cleanup(&filters)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "Cleanup done: kept {} entr{}, removed {}",
        stats.kept,
        if stats.kept == 1 { "y" } else { "ies" },
        stats.removed
    );
    Ok(())
}

async fn cmd_history(store: &PathBuf) -> Result<(), String> {
    let storage = JsonFileStorage::new(store);
    let history = storage
        .load_history()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    if history.is_empty() {
        println!("Visit history is empty.");
        return Ok(());
    }

    println!("{} entr{}:", history.len(), if history.len() == 1 { "y" } else { "ies" });
    for (url, timestamp) in history.entries() {
        println!("  {timestamp}  {url}");
    }
    Ok(())
}

fn cmd_export_types(output: &PathBuf) -> Result<(), String> {
    fs::create_dir_all(output)
        .map_err(|e| format!("Failed to create '{}': {e}", output.display()))?;

    Command::export_all_to(output).map_err(|e| format!("Failed to export Command: {e}"))?;
    Ack::export_all_to(output).map_err(|e| format!("Failed to export Ack: {e}"))?;

    println!("TypeScript definitions written to '{}'", output.display());
    Ok(())
}
