//! Integration tests for simrec-store
//!
//! These tests verify score upserts, canonical similarity storage and pair
//! queries against a real SQLite database.

use simrec_domain::traits::{PairQuery, ScoreOrder, ScoreStore, SimilarityStore};
use simrec_domain::{ActorKey, ItemRef, ItemResolver};
use simrec_store::{SqliteStore, StoreError};
use std::collections::HashMap;

fn quote(id: i64) -> ItemRef {
    ItemRef::new("quote", id)
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_set_score_with_existing() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let user = ActorKey::user(1);

    let score = store.set_score(&user, &quote(1), 3.0).unwrap();
    assert_eq!(score.value, 3.0);

    let updated = store.set_score(&user, &quote(1), 7.0).unwrap();
    assert_eq!(updated.id, score.id, "Re-rating must update the same row");
    assert_eq!(updated.value, 7.0);
    assert_eq!(store.count_scores().unwrap(), 1);
}

#[test]
fn test_get_score_when_unset() {
    let store = SqliteStore::new(":memory:").unwrap();
    assert_eq!(store.get_score(&ActorKey::new("nobody"), &quote(1)).unwrap(), 0.0);
}

#[test]
fn test_set_score_if_absent_keeps_first_value() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let actor = ActorKey::new("qwerty");

    let (first, created) = store.set_score_if_absent(&actor, &quote(1), 20.0).unwrap();
    assert!(created);
    assert_eq!(first.value, 20.0);

    let (second, created) = store.set_score_if_absent(&actor, &quote(1), 3.0).unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(store.get_score(&actor, &quote(1)).unwrap(), 20.0);
}

#[test]
fn test_scores_for_item() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.set_score(&ActorKey::new("foo"), &quote(2), 2.0).unwrap();
    store.set_score(&ActorKey::new("bar"), &quote(2), 3.0).unwrap();
    store.set_score(&ActorKey::new("baz"), &quote(4), 5.0).unwrap();

    let expected = HashMap::from([("foo".to_string(), 2.0), ("bar".to_string(), 3.0)]);
    assert_eq!(store.scores_for(&quote(2)).unwrap(), expected);
    assert!(store.scores_for(&quote(9)).unwrap().is_empty());
}

#[test]
fn test_non_finite_score_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let result = store.set_score(&ActorKey::new("foo"), &quote(1), f64::NAN);
    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert_eq!(store.count_scores().unwrap(), 0);
}

#[test]
fn test_duplicate_insert_is_validation_error() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let actor = ActorKey::new("foo");

    store.insert_score(&actor, &quote(1), 1.0).unwrap();
    let result = store.insert_score(&actor, &quote(1), 2.0);

    assert!(
        matches!(result, Err(StoreError::Validation(_))),
        "Duplicate unique key outside the upsert path should be rejected"
    );
    assert_eq!(store.get_score(&actor, &quote(1)).unwrap(), 1.0);
}

#[test]
fn test_delete_score() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let actor = ActorKey::new("foo");
    store.set_score(&actor, &quote(1), 1.0).unwrap();

    assert!(store.delete_score(&actor, &quote(1)).unwrap());
    assert!(!store.delete_score(&actor, &quote(1)).unwrap());
    assert_eq!(store.get_score(&actor, &quote(1)).unwrap(), 0.0);
}

#[test]
fn test_set_similarity_canonical_order() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let (x, y) = (quote(30), quote(40));

    let pair = store.set_similarity(&x, &y, 10.0).unwrap().unwrap();
    assert_eq!(pair.item_a, x);
    assert_eq!(pair.item_b, y);

    // Reversed arguments land on the same row
    let reversed = store.set_similarity(&y, &x, 20.0).unwrap().unwrap();
    assert_eq!(reversed.id, pair.id);
    assert_eq!(reversed.item_a, x);
    assert_eq!(reversed.item_b, y);
    assert_eq!(reversed.score, 20.0);
    assert_eq!(store.count_pairs().unwrap(), 1);
}

#[test]
fn test_set_similarity_across_kinds() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let person = ItemRef::new("person", 99);
    let q = quote(1);

    let pair = store.set_similarity(&q, &person, 1.5).unwrap().unwrap();
    assert_eq!(pair.item_a, person, "kind is compared before id");
    assert_eq!(
        store.get_similarity(&person, &q).unwrap().map(|p| p.id),
        Some(pair.id)
    );
}

#[test]
fn test_self_similarity_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    for score in [0.0, 1.0, -3.0] {
        let result = store.set_similarity(&quote(1), &quote(1), score);
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }
    assert_eq!(store.count_pairs().unwrap(), 0);
}

#[test]
fn test_set_existing_updates_score() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let first = store.set_similarity(&quote(1), &quote(2), 5.0).unwrap().unwrap();
    let second = store.set_similarity(&quote(1), &quote(2), 9.0).unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.score, 9.0);
    assert_eq!(store.count_pairs().unwrap(), 1);
}

#[test]
fn test_set_existing_to_zero_deletes() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.set_similarity(&quote(12), &quote(22), 10.0).unwrap();

    let result = store.set_similarity(&quote(12), &quote(22), 0.0).unwrap();

    assert!(result.is_none());
    assert!(store.get_similarity(&quote(12), &quote(22)).unwrap().is_none());
    assert!(store.pairs_for(&PairQuery::for_item(quote(12))).unwrap().is_empty());
}

#[test]
fn test_set_zero_does_not_create() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let result = store.set_similarity(&quote(12), &quote(22), 0.0).unwrap();

    assert!(result.is_none());
    assert_eq!(store.count_pairs().unwrap(), 0);
}

#[test]
fn test_pairs_for_orders_by_score() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let x = quote(1);
    store.set_similarity(&x, &quote(2), 10.0).unwrap();
    store.set_similarity(&x, &quote(3), 5.0).unwrap();
    store.set_similarity(&quote(4), &x, 12.0).unwrap();
    store.set_similarity(&quote(2), &quote(3), 50.0).unwrap();

    let pairs = store.pairs_for(&PairQuery::for_item(x.clone())).unwrap();
    let scores: Vec<f64> = pairs.iter().map(|p| p.score).collect();
    assert_eq!(scores, vec![12.0, 10.0, 5.0]);

    let ascending = store
        .pairs_for(&PairQuery::for_item(x.clone()).order(ScoreOrder::Ascending).limit(2))
        .unwrap();
    let scores: Vec<f64> = ascending.iter().map(|p| p.score).collect();
    assert_eq!(scores, vec![5.0, 10.0]);
}

#[test]
fn test_pairs_for_ties_follow_insertion_order() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let x = quote(5);
    store.set_similarity(&x, &quote(9), 3.0).unwrap();
    store.set_similarity(&x, &quote(1), 3.0).unwrap();
    store.set_similarity(&x, &quote(7), 3.0).unwrap();

    let partners: Vec<ItemRef> = store
        .pairs_for(&PairQuery::for_item(x.clone()))
        .unwrap()
        .iter()
        .filter_map(|p| p.other(&x).cloned())
        .collect();
    assert_eq!(partners, vec![quote(9), quote(1), quote(7)]);
}

#[test]
fn test_exclude_items() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = quote(1);
    let sim_b = store.set_similarity(&a, &quote(2), 1.0).unwrap().unwrap();
    store.set_similarity(&a, &quote(3), 2.0).unwrap();
    let sim_d = store.set_similarity(&a, &quote(4), 3.0).unwrap().unwrap();

    let query = PairQuery::all()
        .order(ScoreOrder::Ascending)
        .exclude_items([quote(3)]);
    let pairs = store.pairs_for(&query).unwrap();

    assert_eq!(pairs, vec![sim_b, sim_d]);
}

#[test]
fn test_filter_items() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = quote(1);
    let sim_ab = store.set_similarity(&a, &quote(2), 1.0).unwrap().unwrap();
    let sim_ac = store.set_similarity(&a, &quote(3), 2.0).unwrap().unwrap();
    let sim_ad = store.set_similarity(&a, &quote(4), 3.0).unwrap().unwrap();
    store.set_similarity(&quote(2), &quote(3), 5.0).unwrap();
    store.set_similarity(&quote(2), &quote(4), 6.0).unwrap();

    let query = PairQuery::all()
        .filter_items([a.clone()])
        .order(ScoreOrder::Ascending);
    let pairs = store.pairs_for(&query).unwrap();

    assert_eq!(pairs, vec![sim_ab, sim_ac, sim_ad]);
}

#[test]
fn test_filter_with_empty_set_matches_nothing() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.set_similarity(&quote(1), &quote(2), 1.0).unwrap();

    let pairs = store.pairs_for(&PairQuery::all().filter_items(Vec::new())).unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn test_large_item_sets() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let a = quote(1);
    store.set_similarity(&a, &quote(2), 1.0).unwrap();
    let kept = store.set_similarity(&a, &quote(5000), 2.0).unwrap().unwrap();

    // Thousands of items must still fit in one statement
    let hidden: Vec<ItemRef> = (2..3000).map(quote).collect();

    let excluded = store
        .pairs_for(&PairQuery::for_item(a.clone()).exclude_items(hidden.clone()))
        .unwrap();
    assert_eq!(excluded, vec![kept]);

    let filtered = store
        .pairs_for(&PairQuery::for_item(a.clone()).filter_items(hidden))
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].other(&a), Some(&quote(2)));
}

#[test]
fn test_filter_items_across_kinds() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let author = ItemRef::new("author", 2);
    store.set_similarity(&quote(1), &quote(2), 1.0).unwrap();
    let cross = store.set_similarity(&quote(1), &author, 2.0).unwrap().unwrap();

    let pairs = store.pairs_for(&PairQuery::all().filter_items([author])).unwrap();
    assert_eq!(pairs, vec![cross]);
}

#[test]
fn test_set_similarities_batch() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.set_similarity(&quote(1), &quote(4), 9.0).unwrap();

    store
        .set_similarities(&[
            (quote(2), quote(1), 3.0),
            (quote(1), quote(3), 4.0),
            (quote(1), quote(4), 0.0),
        ])
        .unwrap();

    assert_eq!(store.get_similarity(&quote(1), &quote(2)).unwrap().unwrap().score, 3.0);
    assert_eq!(store.get_similarity(&quote(1), &quote(3)).unwrap().unwrap().score, 4.0);
    assert!(store.get_similarity(&quote(1), &quote(4)).unwrap().is_none());
}

#[test]
fn test_set_similarities_is_all_or_nothing() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.set_similarity(&quote(1), &quote(2), 1.0).unwrap();

    let result = store.set_similarities(&[
        (quote(1), quote(2), 5.0),
        (quote(3), quote(3), 1.0),
        (quote(1), quote(4), 2.0),
    ]);

    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert_eq!(store.get_similarity(&quote(1), &quote(2)).unwrap().unwrap().score, 1.0);
    assert!(store.get_similarity(&quote(1), &quote(4)).unwrap().is_none());
}

#[test]
fn test_store_and_domain_filters_agree() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    for (a, b, s) in [(1, 2, 1.0), (1, 3, 2.0), (2, 3, 3.0), (3, 4, 4.0), (1, 4, 5.0)] {
        store.set_similarity(&quote(a), &quote(b), s).unwrap();
    }

    let query = PairQuery::for_item(quote(1))
        .exclude_items([quote(4)])
        .filter_items([quote(2), quote(3)]);

    let from_store = store.pairs_for(&query).unwrap();
    let from_domain: Vec<_> = store
        .pairs_for(&PairQuery::all())
        .unwrap()
        .into_iter()
        .filter(|p| query.matches(p))
        .collect();

    assert_eq!(from_store, from_domain);
    assert_eq!(from_store.len(), 2);
}

#[test]
fn test_neighborhood_queries() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let (foo, bar) = (ActorKey::new("foo"), ActorKey::new("bar"));
    store.set_score(&foo, &quote(1), 3.0).unwrap();
    store.set_score(&foo, &quote(2), 2.0).unwrap();
    store.set_score(&bar, &quote(2), 3.0).unwrap();
    store.set_score(&bar, &quote(3), 4.0).unwrap();

    assert_eq!(store.actors_for(&quote(2)).unwrap(), vec![bar.clone(), foo.clone()]);
    assert_eq!(
        store.items_rated_by(&[foo, bar]).unwrap(),
        vec![quote(1), quote(2), quote(3)]
    );
    assert_eq!(store.scored_items().unwrap(), vec![quote(1), quote(2), quote(3)]);
}

#[test]
fn test_delete_item_cascades() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let foo = ActorKey::new("foo");
    for id in 1..=3 {
        store.register_item(&quote(id)).unwrap();
        store.set_score(&foo, &quote(id), 1.0).unwrap();
    }
    store.set_similarity(&quote(1), &quote(2), 1.0).unwrap();
    store.set_similarity(&quote(2), &quote(3), 1.0).unwrap();
    store.set_similarity(&quote(1), &quote(3), 1.0).unwrap();

    let deletion = store.delete_item(&quote(2)).unwrap();

    assert!(deletion.existed);
    assert_eq!(deletion.scores, 1);
    assert_eq!(deletion.pairs, 2);
    assert!(!store.contains_item(&quote(2)).unwrap());
    assert_eq!(store.count_pairs().unwrap(), 1);
    assert_eq!(store.count_scores().unwrap(), 2);
}

#[test]
fn test_purge_leaves_other_items() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let foo = ActorKey::new("foo");
    store.set_score(&foo, &quote(1), 1.0).unwrap();
    store.set_score(&foo, &quote(2), 1.0).unwrap();
    store.set_similarity(&quote(1), &quote(2), 1.0).unwrap();

    assert_eq!(store.purge_scores_for(&quote(2)).unwrap(), 1);
    assert_eq!(store.purge_pairs_for(&quote(2)).unwrap(), 1);
    assert_eq!(store.get_score(&foo, &quote(1)).unwrap(), 1.0);
}

#[test]
fn test_file_backed_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simrec.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.set_score(&ActorKey::new("foo"), &quote(1), 4.0).unwrap();
        store.set_similarity(&quote(1), &quote(2), 8.0).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert_eq!(store.get_score(&ActorKey::new("foo"), &quote(1)).unwrap(), 4.0);
    assert_eq!(
        store.get_similarity(&quote(2), &quote(1)).unwrap().map(|p| p.score),
        Some(8.0)
    );
}
