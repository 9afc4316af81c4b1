//! Trait definitions for external interactions
//!
//! These traits define the boundary between the similarity engine and the
//! persistent store. Infrastructure implementations live in other crates.

use crate::{ActorKey, ItemRef, Score, SimilarityPair};
use std::collections::HashMap;
use std::fmt;

/// Error raised by a storage backend
///
/// Lets callers tell a violated data invariant (a caller bug, always
/// surfaced) apart from an infrastructure failure without knowing the
/// backend's concrete error type.
pub trait StorageError: fmt::Display {
    /// Whether this error reports a rejected write rather than a backend failure
    fn is_validation(&self) -> bool;
}

/// Trait for storing actor scores
///
/// Implemented by the infrastructure layer (simrec-store)
pub trait ScoreStore {
    /// Error type for store operations
    type Error: StorageError;

    /// Insert or overwrite the score of `actor` for `item`
    fn set_score(&mut self, actor: &ActorKey, item: &ItemRef, value: f64)
        -> Result<Score, Self::Error>;

    /// Insert the score only if none exists yet
    ///
    /// Returns the stored record and whether it was created by this call.
    fn set_score_if_absent(
        &mut self,
        actor: &ActorKey,
        item: &ItemRef,
        value: f64,
    ) -> Result<(Score, bool), Self::Error>;

    /// Get a score, `0.0` when the actor never rated the item
    fn get_score(&self, actor: &ActorKey, item: &ItemRef) -> Result<f64, Self::Error>;

    /// All scores for one item, keyed by actor key
    fn scores_for(&self, item: &ItemRef) -> Result<HashMap<String, f64>, Self::Error>;

    /// Remove a single score; returns whether a row existed
    fn delete_score(&mut self, actor: &ActorKey, item: &ItemRef) -> Result<bool, Self::Error>;

    /// Distinct actors who rated `item`
    fn actors_for(&self, item: &ItemRef) -> Result<Vec<ActorKey>, Self::Error>;

    /// Distinct items rated by any of `actors`
    fn items_rated_by(&self, actors: &[ActorKey]) -> Result<Vec<ItemRef>, Self::Error>;

    /// Distinct items that have at least one score
    fn scored_items(&self) -> Result<Vec<ItemRef>, Self::Error>;

    /// Delete every score of `item`; returns the number of rows removed
    fn purge_scores_for(&mut self, item: &ItemRef) -> Result<usize, Self::Error>;
}

/// Trait for storing pairwise similarities
///
/// Implemented by the infrastructure layer (simrec-store)
pub trait SimilarityStore {
    /// Error type for store operations
    type Error: StorageError;

    /// Write the similarity of two items
    ///
    /// Implementations must reject `a == b`, store the pair in canonical
    /// order, and treat a score of zero as a deletion (returning `None`).
    fn set_similarity(
        &mut self,
        a: &ItemRef,
        b: &ItemRef,
        score: f64,
    ) -> Result<Option<SimilarityPair>, Self::Error>;

    /// Write a batch of similarities, each with the rules of `set_similarity`
    ///
    /// Backends with transactions apply all writes or none. The default
    /// writes them one at a time.
    fn set_similarities(&mut self, writes: &[(ItemRef, ItemRef, f64)]) -> Result<(), Self::Error> {
        for (a, b, score) in writes {
            self.set_similarity(a, b, *score)?;
        }
        Ok(())
    }

    /// Get the stored similarity of two items, in either argument order
    fn get_similarity(&self, a: &ItemRef, b: &ItemRef)
        -> Result<Option<SimilarityPair>, Self::Error>;

    /// Query pairs matching criteria
    fn pairs_for(&self, query: &PairQuery) -> Result<Vec<SimilarityPair>, Self::Error>;

    /// Delete every pair involving `item`; returns the number of rows removed
    fn purge_pairs_for(&mut self, item: &ItemRef) -> Result<usize, Self::Error>;
}

/// Trait for checking that an item still exists
///
/// Items live outside this system; the resolver is the only way the engine
/// learns that one was deleted.
pub trait ItemResolver {
    /// Error type for resolver operations
    type Error: StorageError;

    /// Whether `item` can still be resolved
    fn contains_item(&self, item: &ItemRef) -> Result<bool, Self::Error>;
}

/// Everything the similarity engine needs from a backend
pub trait RecommendStore: ScoreStore + SimilarityStore + ItemResolver {}

impl<T: ScoreStore + SimilarityStore + ItemResolver> RecommendStore for T {}

/// Sort direction for pair queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreOrder {
    /// Most similar first
    #[default]
    Descending,

    /// Least similar first
    Ascending,
}

/// Query criteria for retrieving similarity pairs
///
/// # Examples
///
/// ```
/// use simrec_domain::{ItemRef, PairQuery};
///
/// let stale = vec![ItemRef::new("quote", 3)];
/// let query = PairQuery::for_item(ItemRef::new("quote", 1))
///     .exclude_items(stale)
///     .limit(5);
/// assert_eq!(query.limit, Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PairQuery {
    /// Only pairs involving this item (all pairs when `None`)
    pub item: Option<ItemRef>,

    /// Maximum results to return
    pub limit: Option<usize>,

    /// Sort direction on score; ties fall back to insertion order
    pub order: ScoreOrder,

    /// Drop pairs where either side is in this set
    pub excluded: Vec<ItemRef>,

    /// Keep only pairs where at least one side is in this set
    pub included: Option<Vec<ItemRef>>,
}

impl PairQuery {
    /// Every stored pair
    pub fn all() -> Self {
        Self::default()
    }

    /// Pairs involving `item`
    pub fn for_item(item: ItemRef) -> Self {
        Self {
            item: Some(item),
            ..Self::default()
        }
    }

    /// Truncate to `limit` results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the sort direction
    pub fn order(mut self, order: ScoreOrder) -> Self {
        self.order = order;
        self
    }

    /// Exclude pairs touching any of `items`
    ///
    /// Repeated calls accumulate.
    pub fn exclude_items(mut self, items: impl IntoIterator<Item = ItemRef>) -> Self {
        self.excluded.extend(items);
        self
    }

    /// Restrict to pairs touching at least one of `items`
    ///
    /// Repeated calls narrow the set to items passed every time.
    pub fn filter_items(mut self, items: impl IntoIterator<Item = ItemRef>) -> Self {
        let items: Vec<ItemRef> = items.into_iter().collect();
        self.included = Some(match self.included.take() {
            Some(existing) => existing.into_iter().filter(|i| items.contains(i)).collect(),
            None => items,
        });
        self
    }

    /// Whether a pair satisfies the item filters (ignores limit and order)
    pub fn matches(&self, pair: &SimilarityPair) -> bool {
        if let Some(item) = &self.item {
            if !pair.involves(item) {
                return false;
            }
        }

        if self.excluded.iter().any(|e| pair.involves(e)) {
            return false;
        }

        match &self.included {
            Some(included) => included.iter().any(|i| pair.involves(i)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: i64, b: i64) -> SimilarityPair {
        SimilarityPair {
            id: 1,
            item_a: ItemRef::new("quote", a),
            item_b: ItemRef::new("quote", b),
            score: 1.0,
        }
    }

    #[test]
    fn test_exclude_drops_either_side() {
        let query = PairQuery::all().exclude_items([ItemRef::new("quote", 3)]);
        assert!(query.matches(&pair(1, 2)));
        assert!(!query.matches(&pair(1, 3)));
        assert!(!query.matches(&pair(3, 4)));
    }

    #[test]
    fn test_filter_keeps_either_side() {
        let query = PairQuery::all().filter_items([ItemRef::new("quote", 1)]);
        assert!(query.matches(&pair(1, 2)));
        assert!(!query.matches(&pair(2, 3)));
    }

    #[test]
    fn test_repeated_filters_intersect() {
        let query = PairQuery::all()
            .filter_items([ItemRef::new("quote", 1), ItemRef::new("quote", 2)])
            .filter_items([ItemRef::new("quote", 2)]);
        assert_eq!(query.included, Some(vec![ItemRef::new("quote", 2)]));
    }
}
