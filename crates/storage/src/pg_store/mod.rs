//! PostgreSQL backend using sqlx and pgvector.
//!
//! The embedding column is `halfvec(N)` (or `vector(N)` for single
//! precision) behind an HNSW cosine index.

mod schema;
mod search;
mod tx;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use ledger_vectordb_core::{
    ClosestMatch, ClosestQuery, PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS,
    PG_POOL_MAX_CONNECTIONS, StoredVector, VectorDbConfig,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

pub use tx::PgTx;

use crate::error::StorageError;
use crate::schema::TableNames;
use crate::traits::{VectorCapabilities, VectorStore, check_dimensions};

#[derive(Clone, Debug)]
pub struct PgVectorStore {
    pool: PgPool,
    names: Arc<TableNames>,
    config: Arc<OnceLock<VectorDbConfig>>,
    ef_search: Option<u32>,
}

impl PgVectorStore {
    pub async fn new(
        database_url: &str,
        chain_iid: u64,
        ef_search: Option<u32>,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        tracing::info!(chain_iid, ?ef_search, "PgVectorStore connected");
        Ok(Self::from_pool(pool, chain_iid, ef_search))
    }

    /// Share a pool the host already owns.
    #[must_use]
    pub fn from_pool(pool: PgPool, chain_iid: u64, ef_search: Option<u32>) -> Self {
        Self {
            pool,
            names: Arc::new(TableNames::for_chain(chain_iid)),
            config: Arc::new(OnceLock::new()),
            ef_search,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn table_names(&self) -> &TableNames {
        &self.names
    }

    /// Wrap a transaction opened by the host so mutations join its block.
    pub fn attach(&self, tx: Transaction<'static, Postgres>) -> Result<PgTx, StorageError> {
        Ok(PgTx::new(tx, Arc::clone(&self.names), self.config()?))
    }

    fn config(&self) -> Result<VectorDbConfig, StorageError> {
        self.config.get().copied().ok_or(StorageError::NotInitialized)
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    type Tx = PgTx;

    async fn capabilities(&self) -> Result<VectorCapabilities, StorageError> {
        schema::probe_capabilities(&self.pool).await
    }

    async fn initialize(&self, config: &VectorDbConfig) -> Result<(), StorageError> {
        if let Some(active) = self.config.get() {
            if active != config {
                return Err(StorageError::SchemaConflict(format!(
                    "store already initialized with {} dimensions ({} precision)",
                    active.dimensions, active.precision
                )));
            }
        }
        schema::initialize(&self.pool, &self.names, config).await?;
        let _ = self.config.set(*config);
        Ok(())
    }

    async fn begin(&self) -> Result<PgTx, StorageError> {
        let config = self.config()?;
        let tx = self.pool.begin().await?;
        Ok(PgTx::new(tx, Arc::clone(&self.names), config))
    }

    async fn query_closest(&self, query: &ClosestQuery) -> Result<Vec<ClosestMatch>, StorageError> {
        let config = self.config()?;
        check_dimensions(&config, &query.embedding)?;
        search::query_closest(&self.pool, &self.names, &config, query, self.ef_search).await
    }

    async fn count_vectors(&self, context: i64, id: Option<i64>) -> Result<u64, StorageError> {
        self.config()?;
        search::count_vectors(&self.pool, &self.names, context, id).await
    }

    async fn fetch_vectors(&self, context: i64) -> Result<Vec<StoredVector>, StorageError> {
        self.config()?;
        search::fetch_vectors(&self.pool, &self.names, context).await
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StorageError> {
        schema::list_indexes(&self.pool, &self.names).await
    }
}
