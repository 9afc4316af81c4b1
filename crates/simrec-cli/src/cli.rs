//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use simrec_domain::{Actor, ItemRef};
use std::path::PathBuf;

/// Simrec CLI - Record implicit feedback and query item-to-item similarities.
#[derive(Debug, Parser)]
#[command(name = "simrec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "SIMREC_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (items only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the item catalog
    Item(ItemArgs),

    /// Record a score
    Rate(RateArgs),

    /// Remove a score
    Unrate(UnrateArgs),

    /// Show one actor's score for an item
    Score(ScoreArgs),

    /// Show every score of an item
    Scores(ScoresArgs),

    /// Show the items most similar to an item
    Similar(SimilarArgs),

    /// Show the stored similarity pairs of an item
    Pairs(PairsArgs),

    /// Recompute the similarities around an item
    Recompute(RecomputeArgs),

    /// Purge scores and similarities of items missing from the catalog
    Purge,
}

/// Arguments for the item command.
#[derive(Debug, Parser)]
pub struct ItemArgs {
    #[command(subcommand)]
    pub action: ItemAction,
}

/// Item catalog actions.
#[derive(Debug, Subcommand)]
pub enum ItemAction {
    /// Register items (format: kind:id)
    Add {
        /// Items to register
        #[arg(required = true, value_parser = ItemRef::parse)]
        items: Vec<ItemRef>,
    },

    /// Remove items together with their scores and similarities
    Remove {
        /// Items to remove
        #[arg(required = true, value_parser = ItemRef::parse)]
        items: Vec<ItemRef>,

        /// Only drop the catalog entry, leaving scores and similarities behind
        #[arg(long)]
        keep_data: bool,
    },

    /// List registered items
    List {
        /// Only items of this kind
        #[arg(short, long)]
        kind: Option<String>,
    },
}

/// Arguments for the rate command.
#[derive(Debug, Parser)]
pub struct RateArgs {
    /// Actor (format: user:<id>, session:<token> or a bare key)
    #[arg(value_parser = Actor::parse)]
    pub actor: Actor,

    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,

    /// Score value
    #[arg(allow_negative_numbers = true)]
    pub value: f64,

    /// Keep an existing score instead of overwriting it
    #[arg(long)]
    pub if_absent: bool,

    /// Store the score without recomputing similarities
    #[arg(long, conflicts_with = "if_absent")]
    pub no_recompute: bool,
}

/// Arguments for the unrate command.
#[derive(Debug, Parser)]
pub struct UnrateArgs {
    /// Actor (format: user:<id>, session:<token> or a bare key)
    #[arg(value_parser = Actor::parse)]
    pub actor: Actor,

    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,
}

/// Arguments for the score command.
#[derive(Debug, Parser)]
pub struct ScoreArgs {
    /// Actor (format: user:<id>, session:<token> or a bare key)
    #[arg(value_parser = Actor::parse)]
    pub actor: Actor,

    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,
}

/// Arguments for the scores command.
#[derive(Debug, Parser)]
pub struct ScoresArgs {
    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,
}

/// Arguments for the similar command.
#[derive(Debug, Parser)]
pub struct SimilarArgs {
    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,

    /// Maximum number of results (defaults to similar_items_limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Leave out pairs involving these items
    #[arg(short, long, value_parser = ItemRef::parse)]
    pub exclude: Vec<ItemRef>,

    /// Fail instead of skipping items missing from the catalog
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the pairs command.
#[derive(Debug, Parser)]
pub struct PairsArgs {
    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Least similar first
    #[arg(long)]
    pub ascending: bool,
}

/// Arguments for the recompute command.
#[derive(Debug, Parser)]
pub struct RecomputeArgs {
    /// Item (format: kind:id)
    #[arg(value_parser = ItemRef::parse)]
    pub item: ItemRef,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
