//! In-memory store used by the unit tests

use simrec_domain::{
    canonical_pair, ActorKey, ItemRef, ItemResolver, PairQuery, Score, ScoreOrder, ScoreStore,
    SimilarityPair, SimilarityStore, StorageError, ValidationError,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

pub(crate) fn quote(id: i64) -> ItemRef {
    ItemRef::new("quote", id)
}

#[derive(Error, Debug)]
pub(crate) enum MockError {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ValidationError> for MockError {
    fn from(err: ValidationError) -> Self {
        MockError::Validation(err.0)
    }
}

impl StorageError for MockError {
    fn is_validation(&self) -> bool {
        matches!(self, MockError::Validation(_))
    }
}

fn finite(value: f64) -> Result<f64, MockError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MockError::Validation(format!("value must be finite, got {}", value)))
    }
}

#[derive(Default)]
pub(crate) struct MockStore {
    pub scores: BTreeMap<(ItemRef, String), (i64, f64)>,
    pub pairs: Vec<SimilarityPair>,
    pub catalog: BTreeSet<ItemRef>,
    next_id: i64,
}

impl MockStore {
    pub fn with_items(items: &[ItemRef]) -> Self {
        Self {
            catalog: items.iter().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn rate(&mut self, actor: &str, item: &ItemRef, value: f64) {
        self.set_score(&ActorKey::new(actor), item, value).unwrap();
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl ScoreStore for MockStore {
    type Error = MockError;

    fn set_score(&mut self, actor: &ActorKey, item: &ItemRef, value: f64) -> Result<Score, MockError> {
        let value = finite(value)?;
        let key = (item.clone(), actor.as_str().to_string());
        let id = match self.scores.get(&key) {
            Some((id, _)) => *id,
            None => self.next_id(),
        };
        self.scores.insert(key, (id, value));

        Ok(Score {
            id,
            actor_key: actor.clone(),
            item: item.clone(),
            value,
        })
    }

    fn set_score_if_absent(
        &mut self,
        actor: &ActorKey,
        item: &ItemRef,
        value: f64,
    ) -> Result<(Score, bool), MockError> {
        let key = (item.clone(), actor.as_str().to_string());
        match self.scores.get(&key) {
            Some((id, existing)) => Ok((
                Score {
                    id: *id,
                    actor_key: actor.clone(),
                    item: item.clone(),
                    value: *existing,
                },
                false,
            )),
            None => Ok((self.set_score(actor, item, value)?, true)),
        }
    }

    fn get_score(&self, actor: &ActorKey, item: &ItemRef) -> Result<f64, MockError> {
        let key = (item.clone(), actor.as_str().to_string());
        Ok(self.scores.get(&key).map(|(_, v)| *v).unwrap_or(0.0))
    }

    fn scores_for(&self, item: &ItemRef) -> Result<HashMap<String, f64>, MockError> {
        Ok(self
            .scores
            .iter()
            .filter(|((i, _), _)| i == item)
            .map(|((_, actor), (_, value))| (actor.clone(), *value))
            .collect())
    }

    fn delete_score(&mut self, actor: &ActorKey, item: &ItemRef) -> Result<bool, MockError> {
        let key = (item.clone(), actor.as_str().to_string());
        Ok(self.scores.remove(&key).is_some())
    }

    fn actors_for(&self, item: &ItemRef) -> Result<Vec<ActorKey>, MockError> {
        Ok(self
            .scores
            .keys()
            .filter(|(i, _)| i == item)
            .map(|(_, actor)| ActorKey::new(actor.clone()))
            .collect())
    }

    fn items_rated_by(&self, actors: &[ActorKey]) -> Result<Vec<ItemRef>, MockError> {
        let items: BTreeSet<ItemRef> = self
            .scores
            .keys()
            .filter(|(_, actor)| actors.iter().any(|a| a.as_str() == actor))
            .map(|(item, _)| item.clone())
            .collect();
        Ok(items.into_iter().collect())
    }

    fn scored_items(&self) -> Result<Vec<ItemRef>, MockError> {
        let items: BTreeSet<ItemRef> = self.scores.keys().map(|(item, _)| item.clone()).collect();
        Ok(items.into_iter().collect())
    }

    fn purge_scores_for(&mut self, item: &ItemRef) -> Result<usize, MockError> {
        let before = self.scores.len();
        self.scores.retain(|(i, _), _| i != item);
        Ok(before - self.scores.len())
    }
}

impl SimilarityStore for MockStore {
    type Error = MockError;

    fn set_similarity(
        &mut self,
        a: &ItemRef,
        b: &ItemRef,
        score: f64,
    ) -> Result<Option<SimilarityPair>, MockError> {
        let (a, b) = canonical_pair(a, b)?;
        let score = finite(score)?;

        if score == 0.0 {
            self.pairs.retain(|p| !(p.item_a == a && p.item_b == b));
            return Ok(None);
        }

        if let Some(pair) = self.pairs.iter_mut().find(|p| p.item_a == a && p.item_b == b) {
            pair.score = score;
            return Ok(Some(pair.clone()));
        }

        let pair = SimilarityPair {
            id: self.next_id(),
            item_a: a,
            item_b: b,
            score,
        };
        self.pairs.push(pair.clone());
        Ok(Some(pair))
    }

    fn get_similarity(&self, a: &ItemRef, b: &ItemRef) -> Result<Option<SimilarityPair>, MockError> {
        if a == b {
            return Ok(None);
        }
        let (a, b) = canonical_pair(a, b)?;
        Ok(self
            .pairs
            .iter()
            .find(|p| p.item_a == a && p.item_b == b)
            .cloned())
    }

    fn pairs_for(&self, query: &PairQuery) -> Result<Vec<SimilarityPair>, MockError> {
        let mut pairs: Vec<SimilarityPair> =
            self.pairs.iter().filter(|p| query.matches(p)).cloned().collect();

        pairs.sort_by(|l, r| {
            let by_score = match query.order {
                ScoreOrder::Descending => r.score.partial_cmp(&l.score),
                ScoreOrder::Ascending => l.score.partial_cmp(&r.score),
            };
            by_score.unwrap_or(Ordering::Equal).then(l.id.cmp(&r.id))
        });

        if let Some(limit) = query.limit {
            pairs.truncate(limit);
        }
        Ok(pairs)
    }

    fn purge_pairs_for(&mut self, item: &ItemRef) -> Result<usize, MockError> {
        let before = self.pairs.len();
        self.pairs.retain(|p| !p.involves(item));
        Ok(before - self.pairs.len())
    }
}

impl ItemResolver for MockStore {
    type Error = MockError;

    fn contains_item(&self, item: &ItemRef) -> Result<bool, MockError> {
        Ok(self.catalog.contains(item))
    }
}
