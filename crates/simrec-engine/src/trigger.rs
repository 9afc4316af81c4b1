//! Update trigger
//!
//! Decides whether a score change leads to a recompute and where that
//! recompute runs. Every failure is absorbed here: a recompute never reports
//! back to the write that scheduled it.

use crate::engine::{RecomputeReport, SimilarityEngine};
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use simrec_domain::{ItemRef, RecommendStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

/// Result of firing the trigger for one score mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Nothing was scheduled
    Idle,

    /// A recompute was handed to the scheduler
    Scheduled,
}

/// A recompute that can be dispatched without knowing the store type
pub trait Recompute: Send + Sync {
    /// Recompute similarities around `item`, absorbing any failure
    fn run(&self, item: &ItemRef);
}

/// Recompute bound to a shared store
pub struct RecomputeTask<S> {
    store: Arc<Mutex<S>>,
    engine: SimilarityEngine,
    metrics: Arc<Mutex<EngineMetrics>>,
}

impl<S: RecommendStore> RecomputeTask<S> {
    /// Create a task sharing `store` and `metrics` with its owner
    pub fn new(
        store: Arc<Mutex<S>>,
        engine: SimilarityEngine,
        metrics: Arc<Mutex<EngineMetrics>>,
    ) -> Self {
        Self {
            store,
            engine,
            metrics,
        }
    }

    /// Run the recompute and record the outcome, returning any error
    pub fn execute(&self, item: &ItemRef) -> Result<RecomputeReport, EngineError> {
        let result = match self.store.lock() {
            Ok(mut store) => self.engine.recompute(&mut *store, item),
            Err(_) => Err(EngineError::Worker("store lock poisoned".to_string())),
        };

        if let Ok(mut metrics) = self.metrics.lock() {
            match &result {
                Ok(report) => metrics.record_recompute(report),
                Err(_) => metrics.record_failure(),
            }
        }

        result
    }
}

impl<S: RecommendStore + Send> Recompute for RecomputeTask<S> {
    fn run(&self, item: &ItemRef) {
        if let Err(e) = self.execute(item) {
            tracing::error!(%item, error = %e, "Similarity recompute failed");
        }
    }
}

/// Where scheduled recomputes run
pub trait Scheduler: Send + Sync {
    /// Request a recompute of `item`; never blocks on its outcome
    fn schedule(&self, item: ItemRef);
}

/// Runs the recompute before returning
pub struct ImmediateScheduler {
    task: Arc<dyn Recompute>,
}

impl ImmediateScheduler {
    /// Create a scheduler running `task` inline
    pub fn new(task: Arc<dyn Recompute>) -> Self {
        Self { task }
    }
}

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, item: ItemRef) {
        self.task.run(&item);
    }
}

/// Runs the recompute on the tokio runtime after a fixed delay
///
/// The delay gives the transaction that wrote the score time to commit. It
/// is not a guarantee: the recompute must cope with the item having been
/// deleted in the meantime.
pub struct DeferredScheduler {
    task: Arc<dyn Recompute>,
    handle: Handle,
    delay: Duration,
}

impl DeferredScheduler {
    /// Create a scheduler spawning onto `handle`
    pub fn new(task: Arc<dyn Recompute>, handle: Handle, delay: Duration) -> Self {
        Self {
            task,
            handle,
            delay,
        }
    }
}

impl Scheduler for DeferredScheduler {
    fn schedule(&self, item: ItemRef) {
        let task = Arc::clone(&self.task);
        let delay = self.delay;

        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let label = item.to_string();
            if let Err(e) = tokio::task::spawn_blocking(move || task.run(&item)).await {
                tracing::error!(item = %label, error = %e, "Deferred recompute aborted");
            }
        });
    }
}

/// Message consumed by the [`RecomputeWorker`](crate::RecomputeWorker)
#[derive(Debug)]
pub enum QueueMessage {
    /// Recompute around this item
    Recompute(ItemRef),

    /// Acknowledge once every earlier message was handled
    Flush(oneshot::Sender<()>),
}

/// Pushes recompute requests onto a channel drained by a background worker
///
/// Only the item reference crosses the channel.
#[derive(Clone)]
pub struct QueueScheduler {
    tx: mpsc::UnboundedSender<QueueMessage>,
}

impl QueueScheduler {
    /// Create a scheduler sending on `tx`
    pub fn new(tx: mpsc::UnboundedSender<QueueMessage>) -> Self {
        Self { tx }
    }

    /// Wait until the worker has handled everything queued so far
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(QueueMessage::Flush(ack_tx))
            .map_err(|_| EngineError::Worker("recompute queue closed".to_string()))?;
        ack_rx
            .await
            .map_err(|_| EngineError::Worker("recompute worker stopped".to_string()))
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, item: ItemRef) {
        if let Err(mpsc::error::SendError(message)) = self.tx.send(QueueMessage::Recompute(item)) {
            tracing::warn!(?message, "Recompute queue closed, request dropped");
        }
    }
}

/// Fires recomputes for score mutations
pub struct UpdateTrigger {
    enabled: bool,
    scheduler: Box<dyn Scheduler>,
}

impl UpdateTrigger {
    /// Create a trigger; when `enabled` is false it never schedules anything
    pub fn new(enabled: bool, scheduler: Box<dyn Scheduler>) -> Self {
        Self { enabled, scheduler }
    }

    /// Whether score changes schedule recomputes
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// React to a score mutation on `item`
    pub fn fire(&self, item: &ItemRef) -> TriggerState {
        if !self.enabled {
            tracing::trace!(%item, "Autocalc disabled, recompute skipped");
            return TriggerState::Idle;
        }

        self.scheduler.schedule(item.clone());
        TriggerState::Scheduled
    }
}
