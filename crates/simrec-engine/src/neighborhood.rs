//! Neighborhood resolution
//!
//! The neighborhood of an item is every item reachable from it through one
//! shared actor: the actors who scored the item, then everything those actors
//! scored. Only pairs inside that set can change when a score on the item
//! changes.

use crate::error::{store_err, EngineError};
use simrec_domain::{ItemRef, ItemResolver, RecommendStore, ScoreStore, SimilarityStore};
use std::collections::BTreeSet;

/// What to do with neighborhood items the resolver no longer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingDataPolicy {
    /// Fail with [`EngineError::NotFound`]
    #[default]
    Strict,

    /// Delete the item's scores and similarities, then carry on without it
    Purge,
}

/// Items affected by a change to `target`, in canonical order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    /// Item the neighborhood was computed for
    pub target: ItemRef,

    /// Live items, sorted, including the target itself
    pub items: Vec<ItemRef>,

    /// Missing items whose data was purged during resolution
    pub purged: Vec<ItemRef>,
}

impl Neighborhood {
    /// Whether `item` is part of the neighborhood
    pub fn contains(&self, item: &ItemRef) -> bool {
        self.items.binary_search(item).is_ok()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no live item remains
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Computes neighborhoods against a store
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborhoodResolver {
    policy: MissingDataPolicy,
}

impl NeighborhoodResolver {
    /// Create a resolver applying `policy` to dangling items
    pub fn new(policy: MissingDataPolicy) -> Self {
        Self { policy }
    }

    /// The missing-data policy in effect
    pub fn policy(&self) -> MissingDataPolicy {
        self.policy
    }

    /// Resolve the neighborhood of `target`
    ///
    /// The target always belongs to its own neighborhood, even when nobody
    /// has scored it yet.
    ///
    /// # Errors
    ///
    /// Under [`MissingDataPolicy::Strict`], returns `NotFound` for the first
    /// item (in canonical order) the store cannot resolve.
    pub fn resolve<S: RecommendStore>(
        &self,
        store: &mut S,
        target: &ItemRef,
    ) -> Result<Neighborhood, EngineError> {
        let actors = store.actors_for(target).map_err(store_err)?;

        let mut items: BTreeSet<ItemRef> = store
            .items_rated_by(&actors)
            .map_err(store_err)?
            .into_iter()
            .collect();
        items.insert(target.clone());

        let mut missing = Vec::new();
        for item in &items {
            if !store.contains_item(item).map_err(store_err)? {
                missing.push(item.clone());
            }
        }

        if !missing.is_empty() {
            match self.policy {
                MissingDataPolicy::Strict => {
                    return Err(EngineError::NotFound(missing.swap_remove(0)));
                }
                MissingDataPolicy::Purge => {
                    for item in &missing {
                        purge_item(store, item)?;
                    }
                }
            }
        }

        let items: Vec<ItemRef> = items
            .into_iter()
            .filter(|item| !missing.contains(item))
            .collect();

        tracing::debug!(
            %target,
            actors = actors.len(),
            items = items.len(),
            purged = missing.len(),
            "Resolved neighborhood"
        );

        Ok(Neighborhood {
            target: target.clone(),
            items,
            purged: missing,
        })
    }
}

/// Delete every score and similarity that references `item`
pub(crate) fn purge_item<S: RecommendStore>(
    store: &mut S,
    item: &ItemRef,
) -> Result<(usize, usize), EngineError> {
    let scores = store.purge_scores_for(item).map_err(store_err)?;
    let pairs = store.purge_pairs_for(item).map_err(store_err)?;

    tracing::warn!(%item, scores, pairs, "Purged data of missing item");

    Ok((scores, pairs))
}
