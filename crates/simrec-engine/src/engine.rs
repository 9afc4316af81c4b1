//! Dot-product similarity recomputation

use crate::config::RecommendConfig;
use crate::error::{store_err, EngineError};
use crate::neighborhood::{purge_item, MissingDataPolicy, NeighborhoodResolver};
use simrec_domain::{
    dot_product, ItemRef, ItemResolver, PairQuery, RecommendStore, ScoreStore, SimilarityStore,
};
use std::collections::{BTreeSet, HashMap};

/// Outcome of one recompute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeReport {
    /// Item whose score change triggered the recompute
    pub target: ItemRef,

    /// Live neighborhood the pairs were computed over
    pub neighborhood: Vec<ItemRef>,

    /// Pairs written with a non-zero score
    pub pairs_written: usize,

    /// Pairs written with a zero score, i.e. deleted
    pub pairs_zeroed: usize,

    /// Missing items purged while resolving the neighborhood
    pub items_purged: usize,
}

/// Recomputes item-to-item similarities from stored scores
///
/// Holds no state between runs: every recompute rebuilds its working set
/// from the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    resolver: NeighborhoodResolver,
}

impl SimilarityEngine {
    /// Create an engine applying `policy` to dangling items
    pub fn new(policy: MissingDataPolicy) -> Self {
        Self {
            resolver: NeighborhoodResolver::new(policy),
        }
    }

    /// Create an engine from configuration
    pub fn from_config(config: &RecommendConfig) -> Self {
        Self::new(config.missing_data_policy())
    }

    /// The missing-data policy in effect
    pub fn policy(&self) -> MissingDataPolicy {
        self.resolver.policy()
    }

    /// Recompute every pair in the neighborhood of `target`
    ///
    /// The similarity of two items is the dot product of their score vectors,
    /// indexed by actor. Pairs the target no longer shares an actor with are
    /// written with a zero score, which deletes them.
    pub fn recompute<S: RecommendStore>(
        &self,
        store: &mut S,
        target: &ItemRef,
    ) -> Result<RecomputeReport, EngineError> {
        tracing::info!(%target, "Starting similarity recompute");

        let neighborhood = self.resolver.resolve(store, target)?;

        let mut vectors: Vec<(&ItemRef, HashMap<String, f64>)> =
            Vec::with_capacity(neighborhood.len());
        for item in &neighborhood.items {
            vectors.push((item, store.scores_for(item).map_err(store_err)?));
        }

        let mut report = RecomputeReport {
            target: target.clone(),
            neighborhood: Vec::new(),
            pairs_written: 0,
            pairs_zeroed: 0,
            items_purged: neighborhood.purged.len(),
        };

        let mut writes = Vec::new();
        for (i, (a, scores_a)) in vectors.iter().enumerate() {
            for (b, scores_b) in &vectors[i + 1..] {
                writes.push(((*a).clone(), (*b).clone(), dot_product(scores_a, scores_b)));
            }
        }

        let stored = store
            .pairs_for(&PairQuery::for_item(target.clone()))
            .map_err(store_err)?;
        for pair in &stored {
            if let Some(partner) = pair.other(target) {
                if !neighborhood.contains(partner) {
                    writes.push((target.clone(), partner.clone(), 0.0));
                }
            }
        }

        // One batch so a failure leaves the previous similarities intact
        store.set_similarities(&writes).map_err(store_err)?;

        report.pairs_zeroed = writes.iter().filter(|(_, _, score)| *score == 0.0).count();
        report.pairs_written = writes.len() - report.pairs_zeroed;

        report.neighborhood = neighborhood.items;

        tracing::info!(
            %target,
            neighborhood = report.neighborhood.len(),
            written = report.pairs_written,
            deleted = report.pairs_zeroed,
            "Similarity recompute finished"
        );

        Ok(report)
    }

    /// Purge scores and similarities of every item the store no longer resolves
    ///
    /// Runs regardless of the configured policy. Returns the purged items in
    /// canonical order.
    pub fn purge_missing<S: RecommendStore>(
        &self,
        store: &mut S,
    ) -> Result<Vec<ItemRef>, EngineError> {
        let mut candidates: BTreeSet<ItemRef> =
            store.scored_items().map_err(store_err)?.into_iter().collect();
        for pair in store.pairs_for(&PairQuery::all()).map_err(store_err)? {
            candidates.insert(pair.item_a);
            candidates.insert(pair.item_b);
        }

        let mut purged = Vec::new();
        for item in candidates {
            if !store.contains_item(&item).map_err(store_err)? {
                purge_item(store, &item)?;
                purged.push(item);
            }
        }

        tracing::info!(count = purged.len(), "Purged missing items");

        Ok(purged)
    }
}
