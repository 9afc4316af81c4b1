//! ScoreStore implementation

use crate::{validate_value, SqliteStore, StoreError};
use rusqlite::{params, OptionalExtension};
use simrec_domain::{ActorKey, ItemRef, Score, ScoreStore};
use std::collections::{BTreeSet, HashMap};

/// Maximum bound parameters per `IN (...)` query
const IN_CHUNK: usize = 500;

impl SqliteStore {
    /// Fetch the full score row for an (actor, item) pair
    pub fn find_score(&self, actor: &ActorKey, item: &ItemRef) -> Result<Option<Score>, StoreError> {
        let score = self
            .conn
            .query_row(
                "SELECT id, actor_key, item_kind, item_id, value
                 FROM scores WHERE actor_key = ?1 AND item_kind = ?2 AND item_id = ?3",
                params![actor.as_str(), &item.kind, item.id],
                |row| {
                    Ok(Score {
                        id: row.get(0)?,
                        actor_key: ActorKey::new(row.get::<_, String>(1)?),
                        item: ItemRef::new(row.get::<_, String>(2)?, row.get(3)?),
                        value: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(score)
    }

    /// Insert a brand-new score, failing if the (actor, item) row exists
    ///
    /// This is the plain insert path; use [`ScoreStore::set_score`] to upsert.
    pub fn insert_score(
        &mut self,
        actor: &ActorKey,
        item: &ItemRef,
        value: f64,
    ) -> Result<Score, StoreError> {
        validate_value(value)?;

        self.conn.execute(
            "INSERT INTO scores (actor_key, item_kind, item_id, value) VALUES (?1, ?2, ?3, ?4)",
            params![actor.as_str(), &item.kind, item.id, value],
        )?;

        Ok(Score {
            id: self.conn.last_insert_rowid(),
            actor_key: actor.clone(),
            item: item.clone(),
            value,
        })
    }

    fn stored_score(&self, actor: &ActorKey, item: &ItemRef) -> Result<Score, StoreError> {
        self.find_score(actor, item)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))
    }
}

impl ScoreStore for SqliteStore {
    type Error = StoreError;

    fn set_score(&mut self, actor: &ActorKey, item: &ItemRef, value: f64) -> Result<Score, Self::Error> {
        validate_value(value)?;

        self.conn.execute(
            "INSERT INTO scores (actor_key, item_kind, item_id, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(actor_key, item_kind, item_id) DO UPDATE SET value = excluded.value",
            params![actor.as_str(), &item.kind, item.id, value],
        )?;

        self.stored_score(actor, item)
    }

    fn set_score_if_absent(
        &mut self,
        actor: &ActorKey,
        item: &ItemRef,
        value: f64,
    ) -> Result<(Score, bool), Self::Error> {
        validate_value(value)?;

        let inserted = self.conn.execute(
            "INSERT INTO scores (actor_key, item_kind, item_id, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(actor_key, item_kind, item_id) DO NOTHING",
            params![actor.as_str(), &item.kind, item.id, value],
        )?;

        Ok((self.stored_score(actor, item)?, inserted == 1))
    }

    fn get_score(&self, actor: &ActorKey, item: &ItemRef) -> Result<f64, Self::Error> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM scores WHERE actor_key = ?1 AND item_kind = ?2 AND item_id = ?3",
                params![actor.as_str(), &item.kind, item.id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.unwrap_or(0.0))
    }

    fn scores_for(&self, item: &ItemRef) -> Result<HashMap<String, f64>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT actor_key, value FROM scores WHERE item_kind = ?1 AND item_id = ?2",
        )?;

        let scores = stmt
            .query_map(params![&item.kind, item.id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(scores)
    }

    fn delete_score(&mut self, actor: &ActorKey, item: &ItemRef) -> Result<bool, Self::Error> {
        let removed = self.conn.execute(
            "DELETE FROM scores WHERE actor_key = ?1 AND item_kind = ?2 AND item_id = ?3",
            params![actor.as_str(), &item.kind, item.id],
        )?;
        Ok(removed == 1)
    }

    fn actors_for(&self, item: &ItemRef) -> Result<Vec<ActorKey>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT actor_key FROM scores
             WHERE item_kind = ?1 AND item_id = ?2 ORDER BY actor_key",
        )?;

        let actors = stmt
            .query_map(params![&item.kind, item.id], |row| {
                Ok(ActorKey::new(row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(actors)
    }

    fn items_rated_by(&self, actors: &[ActorKey]) -> Result<Vec<ItemRef>, Self::Error> {
        let mut items = BTreeSet::new();

        for chunk in actors.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT DISTINCT item_kind, item_id FROM scores WHERE actor_key IN ({})",
                placeholders
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(chunk.iter().map(|a| a.as_str())),
                |row| Ok(ItemRef::new(row.get::<_, String>(0)?, row.get(1)?)),
            )?;

            for row in rows {
                items.insert(row?);
            }
        }

        Ok(items.into_iter().collect())
    }

    fn scored_items(&self) -> Result<Vec<ItemRef>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT item_kind, item_id FROM scores ORDER BY item_kind, item_id",
        )?;

        let items = stmt
            .query_map([], |row| Ok(ItemRef::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn purge_scores_for(&mut self, item: &ItemRef) -> Result<usize, Self::Error> {
        let removed = self.conn.execute(
            "DELETE FROM scores WHERE item_kind = ?1 AND item_id = ?2",
            params![&item.kind, item.id],
        )?;
        Ok(removed)
    }
}
