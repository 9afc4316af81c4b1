//! Simrec Domain Layer
//!
//! Core domain model for item-to-item similarity computed from implicit
//! feedback. This crate has no external dependencies and defines the value
//! objects and trait interfaces every other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Item**: any rateable entity, referenced polymorphically as `(kind, id)`
//! - **Actor**: an identified user or anonymous session, reduced to an [`ActorKey`]
//! - **Score**: the numeric weight an actor assigned to an item
//! - **Similarity pair**: a symmetric similarity stored once under canonical ordering
//! - **Neighborhood**: items reachable from a target through a shared actor
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Storage is described by the traits in [`traits`]; implementations live
//!   in `simrec-store`
//! - Computation and scheduling live in `simrec-engine`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod item;
pub mod score;
pub mod similarity;
pub mod traits;

// Re-exports for convenience
pub use actor::{Actor, ActorKey, IdentityError};
pub use item::ItemRef;
pub use score::Score;
pub use similarity::{canonical_pair, dot_product, SimilarItems, SimilarityPair, ValidationError};
pub use traits::{
    ItemResolver, PairQuery, RecommendStore, ScoreOrder, ScoreStore, SimilarityStore, StorageError,
};
