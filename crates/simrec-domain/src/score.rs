//! Score module - one actor's weight for one item

use crate::{ActorKey, ItemRef};

/// An actor's rating of an item
///
/// "Rating" need not be a 1-5 star vote. Implicit feedback works well: a view
/// might count as 1 point and a favorite as 5.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Row identifier, stable across updates
    pub id: i64,

    /// Who rated
    pub actor_key: ActorKey,

    /// What was rated
    pub item: ItemRef,

    /// The weight
    pub value: f64,
}
