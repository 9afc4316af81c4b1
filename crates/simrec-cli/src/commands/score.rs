//! Score command implementations.

use super::SqliteRecommender;
use crate::cli::{RateArgs, ScoreArgs, ScoresArgs, UnrateArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use simrec_engine::EngineError;

/// Execute the rate command.
pub fn execute_rate(args: RateArgs, recommender: &SqliteRecommender, formatter: &Formatter) -> Result<()> {
    let score = if args.if_absent {
        recommender.setdefault_score(&args.actor, &args.item, args.value)
    } else if args.no_recompute {
        recommender.set_score_without_recompute(&args.actor, &args.item, args.value)
    } else {
        recommender.set_score(&args.actor, &args.item, args.value)
    }
    .map_err(unknown_item_hint)?;

    match score {
        Some(score) => println!("{}", formatter.format_score(&score)?),
        None => println!(
            "{}",
            formatter.warning("Score not recorded: the actor has no stable identity yet")
        ),
    }

    Ok(())
}

/// Point at `item add` when a score targets an unregistered item
fn unknown_item_hint(err: EngineError) -> CliError {
    match err {
        EngineError::NotFound(item) => CliError::InvalidInput(format!(
            "{item} is not in the item catalog, register it with `simrec item add {item}`"
        )),
        other => other.into(),
    }
}

/// Execute the unrate command.
pub fn execute_unrate(
    args: UnrateArgs,
    recommender: &SqliteRecommender,
    formatter: &Formatter,
) -> Result<()> {
    if recommender.delete_score(&args.actor, &args.item)? {
        println!("{}", formatter.success(&format!("Score removed from {}", args.item)));
    } else {
        println!("{}", formatter.info("No score to remove"));
    }

    Ok(())
}

/// Execute the score command.
pub fn execute_score(args: ScoreArgs, recommender: &SqliteRecommender, formatter: &Formatter) -> Result<()> {
    let value = recommender.get_score(&args.actor, &args.item)?;
    println!("{}", formatter.format_value(value)?);
    Ok(())
}

/// Execute the scores command.
pub fn execute_scores(
    args: ScoresArgs,
    recommender: &SqliteRecommender,
    formatter: &Formatter,
) -> Result<()> {
    let scores = recommender.scores_for(&args.item)?;
    println!("{}", formatter.format_scores(&scores)?);
    Ok(())
}
