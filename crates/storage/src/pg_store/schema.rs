use ledger_vectordb_core::{EmbeddingPrecision, VectorDbConfig};
use sqlx::PgPool;

use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};
use crate::traits::VectorCapabilities;

/// First pgvector release with HNSW indexes.
const MIN_HNSW_VERSION: (u32, u32) = (0, 5);
/// First pgvector release with `halfvec`.
const MIN_HALFVEC_VERSION: (u32, u32) = (0, 7);

/// `"0.7.4"` -> `(0, 7)`.
pub(super) fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    Some((major, minor))
}

fn capabilities_for(version: Option<(u32, u32)>) -> VectorCapabilities {
    let Some(version) = version else {
        return VectorCapabilities::default();
    };
    let hnsw = version >= MIN_HNSW_VERSION;
    VectorCapabilities { vector_type: true, cosine_distance: true, top_k: true, ann_index: hnsw }
}

async fn installed_version(pool: &PgPool) -> Result<Option<String>, StorageError> {
    Ok(sqlx::query_scalar("SELECT extversion FROM pg_extension WHERE extname = 'vector'")
        .fetch_optional(pool)
        .await?)
}

/// Reports the installed extension, or the one `CREATE EXTENSION` would install.
pub(super) async fn probe_capabilities(pool: &PgPool) -> Result<VectorCapabilities, StorageError> {
    let version = match installed_version(pool).await? {
        Some(v) => Some(v),
        None => sqlx::query_scalar(
            "SELECT default_version FROM pg_available_extensions WHERE name = 'vector'",
        )
        .fetch_optional(pool)
        .await?,
    };
    Ok(capabilities_for(version.as_deref().and_then(parse_version)))
}

async fn ensure_extension(
    pool: &PgPool,
    precision: EmbeddingPrecision,
) -> Result<String, StorageError> {
    if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS vector").execute(pool).await {
        return Err(StorageError::CapabilityUnavailable(format!(
            "pgvector extension cannot be created: {e}"
        )));
    }
    let version = installed_version(pool)
        .await?
        .ok_or_else(|| StorageError::CapabilityUnavailable("pgvector is not installed".into()))?;
    let parsed = parse_version(&version).ok_or_else(|| {
        StorageError::CapabilityUnavailable(format!("unrecognized pgvector version {version}"))
    })?;
    if parsed < MIN_HNSW_VERSION {
        return Err(StorageError::CapabilityUnavailable(format!(
            "pgvector {version} has no HNSW index, 0.5.0 or newer required"
        )));
    }
    if precision == EmbeddingPrecision::Half && parsed < MIN_HALFVEC_VERSION {
        return Err(StorageError::CapabilityUnavailable(format!(
            "pgvector {version} has no halfvec type, 0.7.0 or newer required"
        )));
    }
    Ok(version)
}

/// Declared type of an existing embedding column, e.g. `halfvec(3)`.
async fn existing_column_type(
    pool: &PgPool,
    names: &TableNames,
) -> Result<Option<String>, StorageError> {
    Ok(sqlx::query_scalar(
        "SELECT format_type(a.atttypid, a.atttypmod)
           FROM pg_attribute a
          WHERE a.attrelid = to_regclass($1::text)
            AND a.attname = $2
            AND NOT a.attisdropped",
    )
    .bind(&names.table)
    .bind(COLUMN_EMBEDDING)
    .fetch_optional(pool)
    .await?)
}

pub(super) fn column_type(config: &VectorDbConfig) -> String {
    format!("{}({})", config.precision.pg_type(), config.dimensions)
}

pub(super) async fn initialize(
    pool: &PgPool,
    names: &TableNames,
    config: &VectorDbConfig,
) -> Result<(), StorageError> {
    let version = ensure_extension(pool, config.precision).await?;

    let expected = column_type(config);
    if let Some(actual) = existing_column_type(pool, names).await? {
        if actual != expected {
            return Err(StorageError::SchemaConflict(format!(
                "{} has embedding column {actual}, configured {expected}",
                names.table
            )));
        }
    }

    let table = &names.table;
    let mut tx = pool.begin().await?;
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
             {COLUMN_CONTEXT} BIGINT NOT NULL,
             {COLUMN_ID} BIGINT NOT NULL,
             {COLUMN_EMBEDDING} {expected} NOT NULL
         )"
    ))
    .execute(&mut *tx)
    .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table} ({COLUMN_CONTEXT}, {COLUMN_ID})",
        names.context_id_index
    ))
    .execute(&mut *tx)
    .await?;
    sqlx::query(&format!("DROP INDEX IF EXISTS {}", names.legacy_l2_index))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table} USING hnsw ({COLUMN_EMBEDDING} {})",
        names.cosine_index,
        config.precision.pg_cosine_ops()
    ))
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(
        table = %table,
        column = %expected,
        pgvector = %version,
        "vector table initialized (hnsw cosine)"
    );
    Ok(())
}

pub(super) async fn list_indexes(
    pool: &PgPool,
    names: &TableNames,
) -> Result<Vec<String>, StorageError> {
    Ok(sqlx::query_scalar(
        "SELECT indexname::text FROM pg_indexes
          WHERE schemaname = current_schema() AND tablename = $1
          ORDER BY indexname",
    )
    .bind(&names.table)
    .fetch_all(pool)
    .await?)
}
