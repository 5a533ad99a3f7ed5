use ledger_vectordb_core::VectorDbConfig;
use rusqlite::{Connection, OptionalExtension, params};

use super::connection::COSINE_DISTANCE_FN;
use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};
use crate::traits::VectorCapabilities;

/// sqlite-vec supplies the vector type; cosine distance and top-K come from
/// the function registered on each connection plus an ordered scan.
pub(super) fn probe_capabilities(conn: &Connection) -> Result<VectorCapabilities, StorageError> {
    let vec_version: Option<String> =
        conn.query_row("SELECT vec_version()", [], |row| row.get(0)).ok();
    let cosine = conn
        .query_row(
            &format!("SELECT {COSINE_DISTANCE_FN}(vec_f32('[1]'), vec_f32('[1]'))"),
            [],
            |row| row.get::<_, Option<f64>>(0),
        )
        .is_ok();
    if let Some(version) = &vec_version {
        tracing::debug!(%version, "sqlite-vec available");
    }
    Ok(VectorCapabilities {
        vector_type: vec_version.is_some(),
        cosine_distance: cosine,
        top_k: cosine,
        ann_index: false,
    })
}

/// Dimensionality is enforced by a CHECK on the blob length (4 bytes per component).
fn embedding_check(config: &VectorDbConfig) -> String {
    format!("length({COLUMN_EMBEDDING}) = {}", config.dimensions * 4)
}

pub(super) fn initialize(
    conn: &Connection,
    names: &TableNames,
    config: &VectorDbConfig,
) -> Result<(), StorageError> {
    probe_capabilities(conn)?.ensure()?;

    let check = embedding_check(config);
    let existing: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![names.table],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(sql) = existing {
        if !sql.contains(&format!("CHECK ({check})")) {
            return Err(StorageError::SchemaConflict(format!(
                "{} exists with a different embedding column than {} dimensions",
                names.table, config.dimensions
            )));
        }
    }

    let ddl = format!(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS {table} (
             {COLUMN_CONTEXT} INTEGER NOT NULL,
             {COLUMN_ID} INTEGER NOT NULL,
             {COLUMN_EMBEDDING} BLOB NOT NULL CHECK ({check})
         );
         CREATE INDEX IF NOT EXISTS {context_id} ON {table} ({COLUMN_CONTEXT}, {COLUMN_ID});
         DROP INDEX IF EXISTS {legacy};
         COMMIT;",
        table = names.table,
        context_id = names.context_id_index,
        legacy = names.legacy_l2_index,
    );
    if let Err(e) = conn.execute_batch(&ddl) {
        if !conn.is_autocommit() {
            let _ = conn.execute_batch("ROLLBACK");
        }
        return Err(e.into());
    }

    tracing::info!(
        table = %names.table,
        dimensions = config.dimensions,
        "vector table initialized (exact cosine scan)"
    );
    Ok(())
}

pub(super) fn list_indexes(
    conn: &Connection,
    names: &TableNames,
) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![names.table], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}
