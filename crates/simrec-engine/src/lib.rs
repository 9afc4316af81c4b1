//! Simrec Engine
//!
//! Recomputes item-to-item similarities when scores change, and exposes the
//! [`Recommender`] facade tying a store to the engine.
//!
//! # Responsibilities
//!
//! - **Neighborhood resolution**: find the items a score change can affect
//! - **Similarity**: dot product of the score vectors of every pair in the
//!   neighborhood, written through the store
//! - **Missing data**: fail or purge when a scored item no longer exists
//! - **Update trigger**: run recomputes inline, after a delay, or on a
//!   background queue, absorbing every failure
//!
//! # Examples
//!
//! ```no_run
//! use simrec_domain::{Actor, ItemRef};
//! use simrec_engine::{RecommendConfig, Recommender};
//! use simrec_store::SqliteStore;
//!
//! let quote = ItemRef::new("quote", 1);
//! let mut store = SqliteStore::new("simrec.db").unwrap();
//! store.register_item(&quote).unwrap();
//!
//! let config = RecommendConfig::from_file("simrec.toml").unwrap();
//! let recommender = Recommender::new(store, config).unwrap();
//! recommender.set_score(&Actor::User(30), &quote, 1.0).unwrap();
//!
//! for item in recommender.similar_items(&quote, None).unwrap().iter() {
//!     println!("{}", item);
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod neighborhood;
pub mod recommender;
pub mod trigger;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ExecutionMode, RecommendConfig};
pub use engine::{RecomputeReport, SimilarityEngine};
pub use error::EngineError;
pub use metrics::EngineMetrics;
pub use neighborhood::{MissingDataPolicy, Neighborhood, NeighborhoodResolver};
pub use recommender::Recommender;
pub use trigger::{
    DeferredScheduler, ImmediateScheduler, QueueMessage, QueueScheduler, Recompute,
    RecomputeTask, Scheduler, TriggerState, UpdateTrigger,
};
pub use worker::RecomputeWorker;
