//! Item catalog command implementation.

use super::{with_store, SqliteRecommender};
use crate::cli::{ItemAction, ItemArgs};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the item command.
pub fn execute_item(
    args: ItemArgs,
    recommender: &SqliteRecommender,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ItemAction::Add { items } => {
            let added = with_store(recommender, |store| {
                let mut added = 0;
                for item in &items {
                    if store.register_item(item)? {
                        added += 1;
                    }
                }
                Ok(added)
            })?;

            if added < items.len() {
                println!(
                    "{}",
                    formatter.info(&format!("{} item(s) already registered", items.len() - added))
                );
            }
            println!("{}", formatter.bulk_result("Registered", added));
        }
        ItemAction::Remove { items, keep_data } => {
            let mut removed = 0;
            for item in &items {
                let existed = if keep_data {
                    with_store(recommender, |store| store.remove_item(item))?
                } else {
                    let deletion = with_store(recommender, |store| store.delete_item(item))?;
                    tracing::debug!(%item, scores = deletion.scores, pairs = deletion.pairs, "Removed item");
                    deletion.existed
                };

                if existed {
                    removed += 1;
                } else {
                    println!("{}", formatter.warning(&format!("{} is not registered", item)));
                }
            }
            println!("{}", formatter.bulk_result("Removed", removed));
        }
        ItemAction::List { kind } => {
            let items = with_store(recommender, |store| store.list_items(kind.as_deref()))?;
            println!("{}", formatter.format_items(&items)?);
        }
    }

    Ok(())
}
