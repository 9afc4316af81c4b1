//! Error types for engine operations

use crate::config::ConfigError;
use simrec_domain::{ItemRef, StorageError};
use thiserror::Error;

/// Errors that can occur while recomputing or querying similarities
#[derive(Error, Debug)]
pub enum EngineError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Store(String),

    /// A write violated a data invariant
    #[error("{0}")]
    Validation(String),

    /// A referenced item no longer exists
    #[error("Item not found: {0}")]
    NotFound(ItemRef),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker error (tokio runtime or lock issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Map a backend error, keeping validation failures distinguishable
pub(crate) fn store_err<E: StorageError>(err: E) -> EngineError {
    if err.is_validation() {
        EngineError::Validation(err.to_string())
    } else {
        EngineError::Store(err.to_string())
    }
}
