//! Simrec Storage Layer
//!
//! Implements the `ScoreStore`, `SimilarityStore` and `ItemResolver` traits
//! on top of SQLite.
//!
//! # Architecture
//!
//! - `scores`: one row per (actor, item), upserted on re-rating
//! - `similarities`: one row per unordered item pair, kept in canonical order,
//!   never holding a zero score
//! - `items`: catalog of items that still exist, consulted when deciding
//!   whether a scored item has gone missing
//!
//! Uniqueness is enforced by the schema; the store surfaces any constraint
//! violation as [`StoreError::Validation`].
//!
//! # Examples
//!
//! ```no_run
//! use simrec_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for score and similarity operations
//! ```

#![warn(missing_docs)]

mod scores;
mod similarities;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use simrec_domain::{ItemRef, ItemResolver, StorageError, ValidationError};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// A write violated a data invariant
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Validation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => StoreError::Database(other),
        }
    }
}

impl StorageError for StoreError {
    fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Validation(err.0)
    }
}

/// Outcome of deleting an item together with everything that references it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemDeletion {
    /// Whether the item was in the catalog
    pub existed: bool,

    /// Score rows removed
    pub scores: usize,

    /// Similarity rows removed
    pub pairs: usize,
}

/// SQLite-based store for scores, similarities and the item catalog
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between threads
/// behind a mutex, or give each thread its own SqliteStore instance on a
/// file-backed database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use simrec_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("simrec.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Add an item to the catalog
    ///
    /// Returns `false` when the item was already registered.
    pub fn register_item(&mut self, item: &ItemRef) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT INTO items (kind, id) VALUES (?1, ?2) ON CONFLICT(kind, id) DO NOTHING",
            params![&item.kind, item.id],
        )?;
        Ok(inserted == 1)
    }

    /// Remove an item from the catalog only
    ///
    /// Scores and similarities that reference the item are left behind, the
    /// same state an externally deleted item produces.
    pub fn remove_item(&mut self, item: &ItemRef) -> Result<bool, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM items WHERE kind = ?1 AND id = ?2",
            params![&item.kind, item.id],
        )?;
        Ok(removed == 1)
    }

    /// Remove an item and every score and similarity referencing it
    pub fn delete_item(&mut self, item: &ItemRef) -> Result<ItemDeletion, StoreError> {
        let tx = self.conn.transaction()?;

        let existed = tx.execute(
            "DELETE FROM items WHERE kind = ?1 AND id = ?2",
            params![&item.kind, item.id],
        )? == 1;
        let scores = tx.execute(
            "DELETE FROM scores WHERE item_kind = ?1 AND item_id = ?2",
            params![&item.kind, item.id],
        )?;
        let pairs = tx.execute(
            "DELETE FROM similarities
             WHERE (item_a_kind = ?1 AND item_a_id = ?2) OR (item_b_kind = ?1 AND item_b_id = ?2)",
            params![&item.kind, item.id],
        )?;

        tx.commit()?;

        tracing::debug!(%item, scores, pairs, "Deleted item with cascade");

        Ok(ItemDeletion {
            existed,
            scores,
            pairs,
        })
    }

    /// List catalog items, optionally restricted to one kind
    pub fn list_items(&self, kind: Option<&str>) -> Result<Vec<ItemRef>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, id FROM items WHERE ?1 IS NULL OR kind = ?1 ORDER BY kind, id",
        )?;

        let items = stmt
            .query_map(params![kind], |row| Ok(ItemRef::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Total number of stored scores
    pub fn count_scores(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Total number of stored similarity pairs
    pub fn count_pairs(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM similarities", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl ItemResolver for SqliteStore {
    type Error = StoreError;

    fn contains_item(&self, item: &ItemRef) -> Result<bool, Self::Error> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM items WHERE kind = ?1 AND id = ?2",
                params![&item.kind, item.id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        Ok(exists)
    }
}

/// Reject scores that are not ordinary numbers
fn validate_value(value: f64) -> Result<(), StoreError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "Score must be a finite number, got {}",
            value
        )))
    }
}
