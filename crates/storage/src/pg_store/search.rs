//! Nearest-neighbor reads and row counts.

use ledger_vectordb_core::{ClosestMatch, ClosestQuery, Embedding, StoredVector, VectorDbConfig};
use sqlx::{PgPool, Row};

use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};

/// Convert `usize` to `i64` for SQL LIMIT binds.
fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val).unwrap_or(i64::MAX)
}

/// The inner CTE orders by distance alone so the planner can serve it from
/// the HNSW index; MATERIALIZED keeps the ceiling from being pushed into it.
fn closest_sql(names: &TableNames, config: &VectorDbConfig) -> String {
    format!(
        "WITH nearest_results AS MATERIALIZED (
             SELECT {COLUMN_ID} AS id, {COLUMN_EMBEDDING} <=> $1::{ty} AS distance
               FROM {table}
              WHERE {COLUMN_CONTEXT} = $2
              ORDER BY distance
              LIMIT $3
         )
         SELECT id, distance FROM nearest_results
          WHERE distance <= $4
          ORDER BY distance, id",
        ty = config.precision.pg_type(),
        table = names.table,
    )
}

pub(super) async fn query_closest(
    pool: &PgPool,
    names: &TableNames,
    config: &VectorDbConfig,
    query: &ClosestQuery,
    ef_search: Option<u32>,
) -> Result<Vec<ClosestMatch>, StorageError> {
    if query.max_results == 0 {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;
    if let Some(ef) = ef_search {
        sqlx::query(&format!("SET LOCAL hnsw.ef_search = {ef}")).execute(&mut *tx).await?;
    }
    let rows = sqlx::query(&closest_sql(names, config))
        .bind(query.embedding.to_literal())
        .bind(query.context)
        .bind(usize_to_i64(query.max_results))
        .bind(query.max_distance)
        .fetch_all(&mut *tx)
        .await?;
    tx.commit().await?;

    let matches = rows
        .iter()
        .map(|row| Ok(ClosestMatch { id: row.try_get("id")?, distance: row.try_get("distance")? }))
        .collect::<Result<Vec<_>, StorageError>>()?;
    tracing::debug!(
        context = query.context,
        max_results = query.max_results,
        max_distance = query.max_distance,
        found = matches.len(),
        "closest objects query"
    );
    Ok(matches)
}

pub(super) async fn count_vectors(
    pool: &PgPool,
    names: &TableNames,
    context: i64,
    id: Option<i64>,
) -> Result<u64, StorageError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table}
          WHERE {COLUMN_CONTEXT} = $1 AND ($2::BIGINT IS NULL OR {COLUMN_ID} = $2)",
        table = names.table
    ))
    .bind(context)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(u64::try_from(count).unwrap_or(0))
}

pub(super) async fn fetch_vectors(
    pool: &PgPool,
    names: &TableNames,
    context: i64,
) -> Result<Vec<StoredVector>, StorageError> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMN_CONTEXT}, {COLUMN_ID}, {COLUMN_EMBEDDING}::text AS embedding
           FROM {table}
          WHERE {COLUMN_CONTEXT} = $1
          ORDER BY {COLUMN_ID}",
        table = names.table
    ))
    .bind(context)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            let id: i64 = row.try_get(COLUMN_ID)?;
            let literal: String = row.try_get("embedding")?;
            let embedding = Embedding::parse(&literal).map_err(|e| {
                StorageError::DataCorruption(format!("undecodable embedding for id {id}: {e}"))
            })?;
            Ok(StoredVector { context: row.try_get(COLUMN_CONTEXT)?, id, embedding })
        })
        .collect()
}
