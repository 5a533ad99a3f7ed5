//! Shared constants for the ledger vector store.

/// Default `max_vectors` when the caller does not supply one.
pub const DEFAULT_MAX_VECTORS: usize = 10;

/// Key of the chain configuration block holding [`crate::VectorDbConfig`].
pub const VECTOR_DB_CONFIG_KEY: &str = "vector_db_extension";

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// SQLite connection pool size when `VECTORDB_DB_POOL_SIZE` is unset.
pub const SQLITE_DEFAULT_POOL_SIZE: u32 = 8;
