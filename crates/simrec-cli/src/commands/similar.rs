//! Similarity query command implementations.

use super::SqliteRecommender;
use crate::cli::{PairsArgs, SimilarArgs};
use crate::error::Result;
use crate::output::Formatter;
use simrec_domain::{ItemRef, PairQuery, ScoreOrder, SimilarItems};

/// Execute the similar command.
pub fn execute_similar(
    args: SimilarArgs,
    recommender: &SqliteRecommender,
    formatter: &Formatter,
) -> Result<()> {
    let similar = if args.exclude.is_empty() {
        recommender.similar_items(&args.item, args.limit)?
    } else {
        let mut query = recommender.similar_pairs(&args.item).exclude_items(args.exclude);
        if let Some(limit) = args.limit {
            query = query.limit(limit);
        }
        SimilarItems::new(args.item.clone(), recommender.pairs(&query)?)
    };

    let live = if args.strict {
        recommender.resolve_similar(&similar, None)?
    } else {
        let mut missing: Vec<ItemRef> = Vec::new();
        let mut record = |item: &ItemRef| missing.push(item.clone());
        let live = recommender.resolve_similar(&similar, Some(&mut record))?;

        for item in &missing {
            eprintln!("{}", formatter.warning(&format!("{} no longer exists, skipped", item)));
        }
        live
    };

    println!("{}", formatter.format_similar(&similar, &live)?);
    Ok(())
}

/// Execute the pairs command.
pub fn execute_pairs(args: PairsArgs, recommender: &SqliteRecommender, formatter: &Formatter) -> Result<()> {
    let order = if args.ascending {
        ScoreOrder::Ascending
    } else {
        ScoreOrder::Descending
    };

    let mut query = PairQuery::for_item(args.item).order(order);
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    let pairs = recommender.pairs(&query)?;
    println!("{}", formatter.format_pairs(&pairs)?);
    Ok(())
}
