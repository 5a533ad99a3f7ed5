//! Nearest-neighbor reads and row counts.

#![allow(clippy::cast_sign_loss, reason = "COUNT(*) is never negative")]

use ledger_vectordb_core::{ClosestMatch, ClosestQuery, Embedding, StoredVector};
use rusqlite::{Connection, params};
use zerocopy::IntoBytes;

use super::connection::{COSINE_DISTANCE_FN, decode_f32_blob};
use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};

/// Candidates are bounded in a MATERIALIZED CTE before the distance ceiling
/// is applied, mirroring the index-friendly shape used on PostgreSQL.
pub(super) fn query_closest(
    conn: &Connection,
    names: &TableNames,
    query: &ClosestQuery,
) -> Result<Vec<ClosestMatch>, StorageError> {
    if query.max_results == 0 {
        return Ok(Vec::new());
    }
    let sql = format!(
        "WITH scored AS (
             SELECT {COLUMN_ID} AS id, {COSINE_DISTANCE_FN}({COLUMN_EMBEDDING}, ?1) AS distance
             FROM {table}
             WHERE {COLUMN_CONTEXT} = ?2
         ),
         nearest_results AS MATERIALIZED (
             SELECT id, distance FROM scored
             ORDER BY (distance IS NULL), distance, id
             LIMIT ?3
         )
         SELECT id, distance FROM nearest_results WHERE distance <= ?4 ORDER BY distance, id",
        table = names.table,
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(
        params![
            query.embedding.as_slice().as_bytes(),
            query.context,
            i64::try_from(query.max_results).unwrap_or(i64::MAX),
            query.max_distance,
        ],
        |row| Ok(ClosestMatch { id: row.get(0)?, distance: row.get(1)? }),
    )?;
    let matches = rows.collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        context = query.context,
        max_results = query.max_results,
        max_distance = query.max_distance,
        found = matches.len(),
        "closest objects query"
    );
    Ok(matches)
}

pub(super) fn count_vectors(
    conn: &Connection,
    names: &TableNames,
    context: i64,
    id: Option<i64>,
) -> Result<u64, StorageError> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {table}
             WHERE {COLUMN_CONTEXT} = ?1 AND (?2 IS NULL OR {COLUMN_ID} = ?2)",
            table = names.table
        ),
        params![context, id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub(super) fn fetch_vectors(
    conn: &Connection,
    names: &TableNames,
    context: i64,
) -> Result<Vec<StoredVector>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMN_CONTEXT}, {COLUMN_ID}, {COLUMN_EMBEDDING} FROM {table}
         WHERE {COLUMN_CONTEXT} = ?1 ORDER BY {COLUMN_ID}, rowid",
        table = names.table
    ))?;
    let rows = stmt.query_map(params![context], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, Vec<u8>>(2)?))
    })?;
    rows.map(|row| -> Result<StoredVector, StorageError> {
        let (context, id, blob) = row?;
        let embedding = decode_f32_blob(&blob)
            .and_then(|components| Embedding::from_components(components).ok())
            .ok_or_else(|| {
                StorageError::DataCorruption(format!("undecodable embedding for id {id}"))
            })?;
        Ok(StoredVector { context, id, embedding })
    })
    .collect()
}
