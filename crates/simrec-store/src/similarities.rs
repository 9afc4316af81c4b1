//! SimilarityStore implementation

use crate::{validate_value, SqliteStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use simrec_domain::{canonical_pair, ItemRef, PairQuery, ScoreOrder, SimilarityPair, SimilarityStore};

const PAIR_COLUMNS: &str = "id, item_a_kind, item_a_id, item_b_kind, item_b_id, score";

impl SqliteStore {
    fn row_to_pair(row: &Row<'_>) -> rusqlite::Result<SimilarityPair> {
        Ok(SimilarityPair {
            id: row.get(0)?,
            item_a: ItemRef::new(row.get::<_, String>(1)?, row.get(2)?),
            item_b: ItemRef::new(row.get::<_, String>(3)?, row.get(4)?),
            score: row.get(5)?,
        })
    }

    /// Fetch the pair stored for an already canonical (a, b)
    fn find_pair(&self, a: &ItemRef, b: &ItemRef) -> Result<Option<SimilarityPair>, StoreError> {
        let sql = format!(
            "SELECT {} FROM similarities
             WHERE item_a_kind = ?1 AND item_a_id = ?2 AND item_b_kind = ?3 AND item_b_id = ?4",
            PAIR_COLUMNS
        );

        let pair = self
            .conn
            .query_row(&sql, params![&a.kind, a.id, &b.kind, b.id], Self::row_to_pair)
            .optional()?;

        Ok(pair)
    }
}

/// Upsert or delete one pair; returns the canonical order it was stored in
fn write_pair(
    conn: &Connection,
    x: &ItemRef,
    y: &ItemRef,
    score: f64,
) -> Result<(ItemRef, ItemRef), StoreError> {
    let (a, b) = canonical_pair(x, y)?;
    validate_value(score)?;

    if score == 0.0 {
        conn.execute(
            "DELETE FROM similarities
             WHERE item_a_kind = ?1 AND item_a_id = ?2 AND item_b_kind = ?3 AND item_b_id = ?4",
            params![&a.kind, a.id, &b.kind, b.id],
        )?;
    } else {
        conn.execute(
            "INSERT INTO similarities (item_a_kind, item_a_id, item_b_kind, item_b_id, score)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(item_a_kind, item_a_id, item_b_kind, item_b_id) DO UPDATE SET
             score = excluded.score",
            params![&a.kind, a.id, &b.kind, b.id, score],
        )?;
    }

    Ok((a, b))
}

/// SQL condition matching pairs where either side equals the bound item
fn involves_clause(params: &mut Vec<Box<dyn rusqlite::ToSql>>, item: &ItemRef) -> String {
    params.push(Box::new(item.kind.clone()));
    params.push(Box::new(item.id));
    let (kind, id) = (params.len() - 1, params.len());
    format!(
        "((item_a_kind = ?{kind} AND item_a_id = ?{id}) OR (item_b_kind = ?{kind} AND item_b_id = ?{id}))"
    )
}

/// Bind an item set as a single JSON array of `[kind, id]` rows
///
/// Keeps the statement size independent of the set size.
fn item_set_param(params: &mut Vec<Box<dyn rusqlite::ToSql>>, items: &[ItemRef]) -> usize {
    let rows: Vec<serde_json::Value> = items
        .iter()
        .map(|item| serde_json::json!([item.kind, item.id]))
        .collect();
    params.push(Box::new(serde_json::Value::Array(rows).to_string()));
    params.len()
}

/// SQL condition: one side of the pair is a member of the bound item set
fn side_in_set(side: &str, param: usize) -> String {
    format!(
        "({side}_kind, {side}_id) IN \
         (SELECT json_extract(value, '$[0]'), json_extract(value, '$[1]') FROM json_each(?{param}))"
    )
}

impl SimilarityStore for SqliteStore {
    type Error = StoreError;

    fn set_similarity(
        &mut self,
        x: &ItemRef,
        y: &ItemRef,
        score: f64,
    ) -> Result<Option<SimilarityPair>, Self::Error> {
        let (a, b) = write_pair(&self.conn, x, y, score)?;
        if score == 0.0 {
            return Ok(None);
        }
        self.find_pair(&a, &b)
    }

    fn set_similarities(&mut self, writes: &[(ItemRef, ItemRef, f64)]) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;
        for (x, y, score) in writes {
            write_pair(&tx, x, y, *score)?;
        }
        tx.commit()?;

        tracing::debug!(count = writes.len(), "Wrote similarity batch");
        Ok(())
    }

    fn get_similarity(&self, x: &ItemRef, y: &ItemRef) -> Result<Option<SimilarityPair>, Self::Error> {
        if x == y {
            return Ok(None);
        }
        let (a, b) = canonical_pair(x, y)?;
        self.find_pair(&a, &b)
    }

    fn pairs_for(&self, query: &PairQuery) -> Result<Vec<SimilarityPair>, Self::Error> {
        let mut sql = format!("SELECT {} FROM similarities WHERE 1=1", PAIR_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(item) = &query.item {
            let clause = involves_clause(&mut params, item);
            sql.push_str(" AND ");
            sql.push_str(&clause);
        }

        if !query.excluded.is_empty() {
            let set = item_set_param(&mut params, &query.excluded);
            sql.push_str(&format!(
                " AND NOT ({}) AND NOT ({})",
                side_in_set("item_a", set),
                side_in_set("item_b", set)
            ));
        }

        if let Some(included) = &query.included {
            let set = item_set_param(&mut params, included);
            sql.push_str(&format!(
                " AND ({} OR {})",
                side_in_set("item_a", set),
                side_in_set("item_b", set)
            ));
        }

        match query.order {
            ScoreOrder::Descending => sql.push_str(" ORDER BY score DESC, id ASC"),
            ScoreOrder::Ascending => sql.push_str(" ORDER BY score ASC, id ASC"),
        }

        if let Some(limit) = query.limit {
            params.push(Box::new(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let pairs = stmt
            .query_map(&param_refs[..], Self::row_to_pair)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pairs)
    }

    fn purge_pairs_for(&mut self, item: &ItemRef) -> Result<usize, Self::Error> {
        let removed = self.conn.execute(
            "DELETE FROM similarities
             WHERE (item_a_kind = ?1 AND item_a_id = ?2) OR (item_b_kind = ?1 AND item_b_id = ?2)",
            params![&item.kind, item.id],
        )?;
        Ok(removed)
    }
}
