//! Command implementations.

pub mod item;
pub mod maintenance;
pub mod score;
pub mod similar;

pub use self::item::execute_item;
pub use self::maintenance::{execute_purge, execute_recompute};
pub use self::score::{execute_rate, execute_score, execute_scores, execute_unrate};
pub use self::similar::{execute_pairs, execute_similar};

use crate::error::Result;
use simrec_engine::{EngineError, Recommender};
use simrec_store::{SqliteStore, StoreError};

/// Recommender over the SQLite store, as used by every command.
pub type SqliteRecommender = Recommender<SqliteStore>;

/// Run `f` against the store behind the recommender.
fn with_store<T>(
    recommender: &SqliteRecommender,
    f: impl FnOnce(&mut SqliteStore) -> std::result::Result<T, StoreError>,
) -> Result<T> {
    let store = recommender.store();
    let mut store = store
        .lock()
        .map_err(|_| EngineError::Worker("store lock poisoned".to_string()))?;
    Ok(f(&mut *store)?)
}
