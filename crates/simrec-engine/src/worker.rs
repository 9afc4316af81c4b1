//! Background worker draining the recompute queue

use crate::trigger::{QueueMessage, Recompute};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Background worker that runs queued recomputes one at a time
///
/// Stands in for an external task queue: producers push item references
/// through a [`QueueScheduler`](crate::QueueScheduler), the worker recomputes
/// them in arrival order on the blocking pool.
///
/// # Examples
///
/// ```no_run
/// use simrec_engine::{Recommender, RecommendConfig, ExecutionMode};
/// use simrec_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteStore::new("simrec.db")?;
///     let config = RecommendConfig {
///         execution: ExecutionMode::Queue,
///         ..Default::default()
///     };
///
///     // Spawns a RecomputeWorker on the current runtime; it stops once the
///     // recommender is dropped and the queue is empty
///     let recommender = Recommender::new(store, config)?;
///     recommender.drain().await?;
///     Ok(())
/// }
/// ```
pub struct RecomputeWorker {
    task: Arc<dyn Recompute>,
    rx: mpsc::UnboundedReceiver<QueueMessage>,
}

impl RecomputeWorker {
    /// Create a worker consuming `rx`
    pub fn new(task: Arc<dyn Recompute>, rx: mpsc::UnboundedReceiver<QueueMessage>) -> Self {
        Self { task, rx }
    }

    /// Run until every sender is dropped
    ///
    /// Messages already queued when the last sender goes away are still
    /// handled.
    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Run until every sender is dropped or `shutdown` completes
    ///
    /// On shutdown the queue is closed to new recomputes and the ones already
    /// queued are run before returning.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Recompute worker started");
        tokio::pin!(shutdown);
        let mut closing = false;
        let mut handled = 0usize;

        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    match message {
                        Some(message) => {
                            if self.handle(message).await {
                                handled += 1;
                            }
                        }
                        None => {
                            tracing::debug!("Recompute queue closed");
                            break;
                        }
                    }
                }
                _ = &mut shutdown, if !closing => {
                    tracing::info!("Shutdown requested, draining recompute queue");
                    closing = true;
                    self.rx.close();
                }
            }
        }

        tracing::info!(handled, "Recompute worker stopped");
    }

    /// Handle one message; returns whether a recompute ran
    async fn handle(&self, message: QueueMessage) -> bool {
        match message {
            QueueMessage::Recompute(item) => {
                let task = Arc::clone(&self.task);
                let label = item.to_string();
                if let Err(e) = tokio::task::spawn_blocking(move || task.run(&item)).await {
                    tracing::error!(item = %label, error = %e, "Queued recompute aborted");
                }
                true
            }
            QueueMessage::Flush(ack) => {
                // Receiver may have given up waiting
                let _ = ack.send(());
                false
            }
        }
    }
}
