//! Similarity module - symmetric pairwise similarity between items
//!
//! A pair is stored exactly once: [`canonical_pair`] orders the two items by
//! [`ItemRef`]'s total order so `(x, y)` and `(y, x)` always land on the same
//! row, and rejects self-similarity before anything is written.

use crate::ItemRef;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A data invariant was violated by a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Computed similarity between two distinct items
///
/// `item_a` always sorts before `item_b`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityPair {
    /// Row identifier, stable across updates
    pub id: i64,

    /// Lower item in canonical ordering
    pub item_a: ItemRef,

    /// Higher item in canonical ordering
    pub item_b: ItemRef,

    /// Similarity score (never zero for a stored pair)
    pub score: f64,
}

impl SimilarityPair {
    /// Whether `item` is one of the two sides of this pair
    pub fn involves(&self, item: &ItemRef) -> bool {
        self.item_a == *item || self.item_b == *item
    }

    /// The side of the pair that is not `item`
    ///
    /// Returns `None` when `item` is not part of the pair.
    pub fn other(&self, item: &ItemRef) -> Option<&ItemRef> {
        if self.item_a == *item {
            Some(&self.item_b)
        } else if self.item_b == *item {
            Some(&self.item_a)
        } else {
            None
        }
    }
}

/// Put two items into canonical order
///
/// # Errors
///
/// Returns a [`ValidationError`] when both references name the same item:
/// an item cannot be similar to itself.
///
/// # Examples
///
/// ```
/// use simrec_domain::{canonical_pair, ItemRef};
///
/// let x = ItemRef::new("quote", 40);
/// let y = ItemRef::new("quote", 30);
///
/// let (a, b) = canonical_pair(&x, &y).unwrap();
/// assert_eq!((a, b), canonical_pair(&y, &x).unwrap());
/// assert!(canonical_pair(&x, &x).is_err());
/// ```
pub fn canonical_pair(x: &ItemRef, y: &ItemRef) -> Result<(ItemRef, ItemRef), ValidationError> {
    if x == y {
        return Err(ValidationError(format!(
            "An item cannot be similar to itself: {}",
            x
        )));
    }

    if x < y {
        Ok((x.clone(), y.clone()))
    } else {
        Ok((y.clone(), x.clone()))
    }
}

/// Dot product of two sparse score vectors
///
/// Only keys present in both maps contribute; a missing key counts as zero.
/// The shared keys are summed in sorted order so the result does not depend
/// on hash iteration order or on which vector is passed first.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use simrec_domain::dot_product;
///
/// let q1 = HashMap::from([("foo", 1.0)]);
/// let q2 = HashMap::from([("foo", 2.0), ("bar", 3.0)]);
/// assert_eq!(dot_product(&q1, &q2), 2.0);
/// ```
pub fn dot_product<K>(x: &HashMap<K, f64>, y: &HashMap<K, f64>) -> f64
where
    K: Hash + Eq + Ord,
{
    let (small, large) = if x.len() <= y.len() { (x, y) } else { (y, x) };

    let mut shared: Vec<(&K, f64)> = small
        .iter()
        .filter_map(|(key, a)| large.get(key).map(|b| (key, a * b)))
        .collect();
    shared.sort_by(|l, r| l.0.cmp(r.0));

    shared.into_iter().map(|(_, product)| product).sum()
}

/// Items most similar to a target, most similar first
///
/// Holds the materialized pairs so the sequence is finite and can be walked
/// any number of times.
#[derive(Debug, Clone)]
pub struct SimilarItems {
    target: ItemRef,
    pairs: Vec<SimilarityPair>,
}

impl SimilarItems {
    /// Build from pairs already ordered by score
    ///
    /// Pairs that do not involve `target` are dropped.
    pub fn new(target: ItemRef, pairs: Vec<SimilarityPair>) -> Self {
        let pairs = pairs.into_iter().filter(|p| p.involves(&target)).collect();
        Self { target, pairs }
    }

    /// The item the sequence was computed for
    pub fn target(&self) -> &ItemRef {
        &self.target
    }

    /// Underlying pairs, in the same order as [`SimilarItems::iter`]
    pub fn pairs(&self) -> &[SimilarityPair] {
        &self.pairs
    }

    /// Iterate the similar items
    pub fn iter(&self) -> impl Iterator<Item = &ItemRef> + '_ {
        self.pairs.iter().filter_map(|p| p.other(&self.target))
    }

    /// Iterate the similar items with their scores
    pub fn scored(&self) -> impl Iterator<Item = (&ItemRef, f64)> + '_ {
        self.pairs
            .iter()
            .filter_map(|p| p.other(&self.target).map(|item| (item, p.score)))
    }

    /// Number of similar items
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no similar item is known
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Collect the similar items into a vector
    pub fn to_vec(&self) -> Vec<ItemRef> {
        self.iter().cloned().collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn item_strategy() -> impl Strategy<Value = ItemRef> {
        ("[a-c]{1,2}", -50i64..50).prop_map(|(kind, id)| ItemRef::new(kind, id))
    }

    proptest! {
        /// Property: argument order never changes the canonical pair
        #[test]
        fn test_canonical_pair_symmetric(x in item_strategy(), y in item_strategy()) {
            match (canonical_pair(&x, &y), canonical_pair(&y, &x)) {
                (Ok(forward), Ok(backward)) => {
                    prop_assert_eq!(&forward, &backward);
                    prop_assert!(forward.0 < forward.1);
                }
                (Err(_), Err(_)) => prop_assert_eq!(x, y),
                _ => return Err(TestCaseError::fail("asymmetric validation")),
            }
        }

        /// Property: dot product is symmetric
        #[test]
        fn test_dot_product_symmetric(
            x in prop::collection::hash_map("[a-e]", -10i32..10, 0..5),
            y in prop::collection::hash_map("[a-e]", -10i32..10, 0..5),
        ) {
            let x: HashMap<String, f64> = x.into_iter().map(|(k, v)| (k, v as f64)).collect();
            let y: HashMap<String, f64> = y.into_iter().map(|(k, v)| (k, v as f64)).collect();
            prop_assert_eq!(dot_product(&x, &y), dot_product(&y, &x));
        }
    }
}
