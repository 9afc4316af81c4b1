//! Simrec CLI - Command-line interface for the simrec similarity recommender.

use clap::Parser;
use simrec_cli::commands;
use simrec_cli::{Cli, Command, Config, Formatter};
use simrec_engine::{ExecutionMode, Recommender};
use simrec_store::SqliteStore;
use std::fs;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> simrec_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let database = cli.db.unwrap_or(config.database);
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::new(&database)?;

    // A one-shot process would exit before a deferred recompute fires
    let mut recommend = config.recommend;
    if recommend.execution == ExecutionMode::Deferred {
        tracing::debug!("Deferred execution runs inline in the CLI");
        recommend.execution = ExecutionMode::Immediate;
    }
    let recommender = Recommender::new(store, recommend)?;

    // Handle commands
    match cli.command {
        Command::Item(args) => commands::execute_item(args, &recommender, &formatter)?,
        Command::Rate(args) => commands::execute_rate(args, &recommender, &formatter)?,
        Command::Unrate(args) => commands::execute_unrate(args, &recommender, &formatter)?,
        Command::Score(args) => commands::execute_score(args, &recommender, &formatter)?,
        Command::Scores(args) => commands::execute_scores(args, &recommender, &formatter)?,
        Command::Similar(args) => commands::execute_similar(args, &recommender, &formatter)?,
        Command::Pairs(args) => commands::execute_pairs(args, &recommender, &formatter)?,
        Command::Recompute(args) => commands::execute_recompute(args, &recommender, &formatter)?,
        Command::Purge => commands::execute_purge(&recommender, &formatter)?,
    }

    // Let queued recomputes finish before exiting
    recommender.drain().await?;

    tracing::debug!("{}", recommender.metrics().summary());

    Ok(())
}
