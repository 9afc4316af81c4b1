//! Recommender facade
//!
//! Ties a store, the similarity engine and the update trigger together. This
//! is the surface callers use to record scores and ask for similar items.

use crate::config::{ConfigError, ExecutionMode, RecommendConfig};
use crate::engine::{RecomputeReport, SimilarityEngine};
use crate::error::{store_err, EngineError};
use crate::metrics::EngineMetrics;
use crate::neighborhood::purge_item;
use crate::trigger::{
    DeferredScheduler, ImmediateScheduler, QueueScheduler, Recompute, RecomputeTask, Scheduler,
    TriggerState, UpdateTrigger,
};
use crate::worker::RecomputeWorker;
use simrec_domain::{
    Actor, ItemRef, ItemResolver, PairQuery, RecommendStore, Score, ScoreStore, SimilarItems,
    SimilarityPair, SimilarityStore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Scores and similarities behind one shared store
///
/// # Examples
///
/// ```
/// use simrec_domain::{Actor, ItemRef};
/// use simrec_engine::{RecommendConfig, Recommender};
/// use simrec_store::SqliteStore;
///
/// let mut store = SqliteStore::new(":memory:").unwrap();
/// let (q1, q2) = (ItemRef::new("quote", 1), ItemRef::new("quote", 2));
/// store.register_item(&q1).unwrap();
/// store.register_item(&q2).unwrap();
///
/// let recommender = Recommender::new(store, RecommendConfig::default()).unwrap();
/// recommender.set_score(&Actor::User(1), &q1, 1.0).unwrap();
/// recommender.set_score(&Actor::User(1), &q2, 2.0).unwrap();
///
/// let similar = recommender.similar_items(&q1, None).unwrap();
/// assert_eq!(similar.to_vec(), vec![q2]);
/// ```
pub struct Recommender<S> {
    store: Arc<Mutex<S>>,
    config: RecommendConfig,
    task: Arc<RecomputeTask<S>>,
    trigger: UpdateTrigger,
    metrics: Arc<Mutex<EngineMetrics>>,
    queue: Option<QueueScheduler>,
}

impl<S: RecommendStore + Send + 'static> Recommender<S> {
    /// Create a recommender executing recomputes as `config.execution` says
    ///
    /// # Errors
    ///
    /// Deferred and queued execution spawn onto the current tokio runtime and
    /// fail with a configuration error outside of one.
    pub fn new(store: S, config: RecommendConfig) -> Result<Self, EngineError> {
        config.validate()?;

        match config.execution {
            ExecutionMode::Immediate => Ok(Self::with_scheduler(store, config, |task| {
                Box::new(ImmediateScheduler::new(task))
            })),
            ExecutionMode::Deferred => {
                let handle = runtime_handle(config.execution)?;
                let delay = config.defer_delay();
                Ok(Self::with_scheduler(store, config, move |task| {
                    Box::new(DeferredScheduler::new(task, handle, delay))
                }))
            }
            ExecutionMode::Queue => {
                let handle = runtime_handle(config.execution)?;
                let (tx, rx) = mpsc::unbounded_channel();
                let queue = QueueScheduler::new(tx);

                let scheduler = queue.clone();
                let mut recommender =
                    Self::with_scheduler(store, config, move |_| Box::new(scheduler));

                let task: Arc<dyn Recompute> = recommender.task.clone();
                handle.spawn(RecomputeWorker::new(task, rx).run());
                recommender.queue = Some(queue);

                Ok(recommender)
            }
        }
    }

    /// Create a recommender with a caller-built scheduler
    ///
    /// `build` receives the recompute task the scheduler must dispatch to.
    pub fn with_scheduler<F>(store: S, config: RecommendConfig, build: F) -> Self
    where
        F: FnOnce(Arc<dyn Recompute>) -> Box<dyn Scheduler>,
    {
        let store = Arc::new(Mutex::new(store));
        let metrics = Arc::new(Mutex::new(EngineMetrics::new()));
        let engine = SimilarityEngine::from_config(&config);
        let task = Arc::new(RecomputeTask::new(store.clone(), engine, metrics.clone()));

        let dispatch: Arc<dyn Recompute> = task.clone();
        let trigger = UpdateTrigger::new(config.enable_autocalc, build(dispatch));

        Self {
            store,
            config,
            task,
            trigger,
            metrics,
            queue: None,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, EngineError> {
        self.store
            .lock()
            .map_err(|_| EngineError::Worker("store lock poisoned".to_string()))
    }

    /// Lock the store for a score write on `item`, which must be in the catalog
    fn lock_for_write(&self, item: &ItemRef) -> Result<MutexGuard<'_, S>, EngineError> {
        let store = self.lock()?;
        if !store.contains_item(item).map_err(store_err)? {
            return Err(EngineError::NotFound(item.clone()));
        }
        Ok(store)
    }

    fn notify(&self, item: &ItemRef) -> TriggerState {
        let state = self.trigger.fire(item);
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_trigger(state == TriggerState::Scheduled);
        }
        state
    }

    /// Record the score of `actor` for `item` and fire the trigger
    ///
    /// An anonymous actor without a session key is logged and skipped, in
    /// which case `None` is returned. Fails with `NotFound` when the item is
    /// not in the catalog. Recompute failures never surface here.
    pub fn set_score(
        &self,
        actor: &Actor,
        item: &ItemRef,
        value: f64,
    ) -> Result<Option<Score>, EngineError> {
        let score = self.write_score(actor, item, value)?;
        if score.is_some() {
            self.notify(item);
        }
        Ok(score)
    }

    /// Record a score without scheduling a recompute
    pub fn set_score_without_recompute(
        &self,
        actor: &Actor,
        item: &ItemRef,
        value: f64,
    ) -> Result<Option<Score>, EngineError> {
        self.write_score(actor, item, value)
    }

    fn write_score(
        &self,
        actor: &Actor,
        item: &ItemRef,
        value: f64,
    ) -> Result<Option<Score>, EngineError> {
        let key = match actor.resolve() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(%item, "{}", e);
                return Ok(None);
            }
        };

        let mut store = self.lock_for_write(item)?;
        let score = store.set_score(&key, item, value).map_err(store_err)?;
        Ok(Some(score))
    }

    /// Record a score only if the actor has not scored the item yet
    ///
    /// Returns the stored record, which is the existing one when nothing was
    /// written. Only a newly created score fires the trigger.
    pub fn setdefault_score(
        &self,
        actor: &Actor,
        item: &ItemRef,
        value: f64,
    ) -> Result<Option<Score>, EngineError> {
        let key = match actor.resolve() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(%item, "{}", e);
                return Ok(None);
            }
        };

        let (score, created) = {
            let mut store = self.lock_for_write(item)?;
            store
                .set_score_if_absent(&key, item, value)
                .map_err(store_err)?
        };

        if created {
            self.notify(item);
        }
        Ok(Some(score))
    }

    /// Score of `actor` for `item`, `0.0` when absent or unidentifiable
    pub fn get_score(&self, actor: &Actor, item: &ItemRef) -> Result<f64, EngineError> {
        let Ok(key) = actor.resolve() else {
            return Ok(0.0);
        };
        let store = self.lock()?;
        store.get_score(&key, item).map_err(store_err)
    }

    /// All scores of `item`, keyed by actor key
    pub fn scores_for(&self, item: &ItemRef) -> Result<HashMap<String, f64>, EngineError> {
        let store = self.lock()?;
        store.scores_for(item).map_err(store_err)
    }

    /// Remove the score of `actor` for `item`, firing the trigger if one existed
    pub fn delete_score(&self, actor: &Actor, item: &ItemRef) -> Result<bool, EngineError> {
        let key = match actor.resolve() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(%item, "{}", e);
                return Ok(false);
            }
        };

        let removed = {
            let mut store = self.lock()?;
            store.delete_score(&key, item).map_err(store_err)?
        };

        if removed {
            self.notify(item);
        }
        Ok(removed)
    }

    /// Drop every score and similarity of an item that has been deleted
    ///
    /// Returns the number of score rows and pair rows removed.
    pub fn delete_item(&self, item: &ItemRef) -> Result<(usize, usize), EngineError> {
        let mut store = self.lock()?;
        purge_item(&mut *store, item)
    }

    /// Recompute similarities around `item` right away, returning any error
    pub fn recompute(&self, item: &ItemRef) -> Result<RecomputeReport, EngineError> {
        self.task.execute(item)
    }

    /// Purge the data of every item the store no longer resolves
    pub fn purge_missing(&self) -> Result<Vec<ItemRef>, EngineError> {
        let purged = {
            let mut store = self.lock()?;
            SimilarityEngine::from_config(&self.config).purge_missing(&mut *store)?
        };

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_purge(purged.len());
        }
        Ok(purged)
    }

    /// Items most similar to `item`, most similar first
    ///
    /// `limit` defaults to `similar_items_limit` from the configuration.
    pub fn similar_items(
        &self,
        item: &ItemRef,
        limit: Option<usize>,
    ) -> Result<SimilarItems, EngineError> {
        let query = PairQuery::for_item(item.clone())
            .limit(limit.unwrap_or(self.config.similar_items_limit));
        let pairs = self.pairs(&query)?;
        Ok(SimilarItems::new(item.clone(), pairs))
    }

    /// Query for the pairs of `item`, ready for further filtering
    ///
    /// Evaluate it with [`pairs`](Self::pairs) after any `exclude_items` or
    /// `filter_items` calls; filters apply before the limit.
    pub fn similar_pairs(&self, item: &ItemRef) -> PairQuery {
        PairQuery::for_item(item.clone()).limit(self.config.similar_items_limit)
    }

    /// Evaluate a pair query
    pub fn pairs(&self, query: &PairQuery) -> Result<Vec<SimilarityPair>, EngineError> {
        let store = self.lock()?;
        store.pairs_for(query).map_err(store_err)
    }

    /// Keep the items of `similar` that still exist
    ///
    /// Missing items are passed to `on_missing` and skipped. Without a
    /// handler the first missing item fails the call with `NotFound`.
    pub fn resolve_similar(
        &self,
        similar: &SimilarItems,
        mut on_missing: Option<&mut dyn FnMut(&ItemRef)>,
    ) -> Result<Vec<ItemRef>, EngineError> {
        let mut liveness = Vec::with_capacity(similar.len());
        {
            let store = self.lock()?;
            for item in similar.iter() {
                liveness.push((item, store.contains_item(item).map_err(store_err)?));
            }
        }

        let mut items = Vec::with_capacity(liveness.len());
        for (item, exists) in liveness {
            if exists {
                items.push(item.clone());
                continue;
            }
            match on_missing.as_deref_mut() {
                Some(handler) => handler(item),
                None => return Err(EngineError::NotFound(item.clone())),
            }
        }

        Ok(items)
    }

    /// Wait for queued recomputes to finish
    ///
    /// Returns immediately unless execution is `queue`.
    pub async fn drain(&self) -> Result<(), EngineError> {
        match &self.queue {
            Some(queue) => queue.flush().await,
            None => Ok(()),
        }
    }

    /// Snapshot of the collected metrics
    pub fn metrics(&self) -> EngineMetrics {
        match self.metrics.lock() {
            Ok(metrics) => metrics.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }
}

fn runtime_handle(mode: ExecutionMode) -> Result<Handle, EngineError> {
    Handle::try_current().map_err(|_| {
        EngineError::Config(ConfigError::Invalid(format!(
            "{:?} execution requires a running tokio runtime",
            mode
        )))
    })
}
