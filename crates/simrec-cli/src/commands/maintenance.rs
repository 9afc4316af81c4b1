//! Recompute and purge command implementations.

use super::SqliteRecommender;
use crate::cli::RecomputeArgs;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the recompute command.
///
/// Runs in the foreground whatever the configured execution mode, so errors
/// reach the user.
pub fn execute_recompute(
    args: RecomputeArgs,
    recommender: &SqliteRecommender,
    formatter: &Formatter,
) -> Result<()> {
    let report = recommender.recompute(&args.item)?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}

/// Execute the purge command.
pub fn execute_purge(recommender: &SqliteRecommender, formatter: &Formatter) -> Result<()> {
    let purged = recommender.purge_missing()?;

    if purged.is_empty() {
        println!("{}", formatter.info("Nothing to purge"));
    } else {
        println!("{}", formatter.format_items(&purged)?);
        println!("{}", formatter.bulk_result("Purged", purged.len()));
    }

    Ok(())
}
