//! `SQLite` backend: sqlite-vec blobs plus an exact top-K scan.
//!
//! Meant for local nodes, tests and tooling. There is no approximate index;
//! the candidate set is produced by ordering every row of the context.
//! Blocking rusqlite calls run on the tokio blocking pool.

mod connection;
mod schema;
mod search;
mod tx;

use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use ledger_vectordb_core::{ClosestMatch, ClosestQuery, StoredVector, VectorDbConfig};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

pub use connection::init_sqlite_vec;
pub use tx::SqliteTx;

use crate::error::StorageError;
use crate::schema::TableNames;
use crate::traits::{VectorCapabilities, VectorStore};

pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Vector store on a pooled `SQLite` database file.
#[derive(Clone, Debug)]
pub struct SqliteVectorStore {
    pub(crate) pool: Pool<SqliteConnectionManager>,
    pub(crate) names: Arc<TableNames>,
    pub(crate) config: Arc<OnceLock<VectorDbConfig>>,
}

/// Get a connection from the pool
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    Ok(pool.get()?)
}

/// Run a blocking closure on the tokio blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Blocking(format!("spawn_blocking join error: {e}")))?
}

impl SqliteVectorStore {
    /// Open (or create) the database file and build the connection pool.
    pub fn new(db_path: &Path, chain_iid: u64, pool_size: u32) -> Result<Self, StorageError> {
        init_sqlite_vec();

        let manager =
            SqliteConnectionManager::file(db_path).with_init(connection::init_connection);
        let pool = Pool::builder().max_size(pool_size.max(2)).build(manager)?;

        tracing::info!(
            path = %db_path.display(),
            chain_iid,
            pool_size,
            "SQLite vector store opened"
        );

        Ok(Self {
            pool,
            names: Arc::new(TableNames::for_chain(chain_iid)),
            config: Arc::new(OnceLock::new()),
        })
    }

    #[must_use]
    pub fn table_names(&self) -> &TableNames {
        &self.names
    }

    pub(crate) fn config(&self) -> Result<VectorDbConfig, StorageError> {
        self.config.get().copied().ok_or(StorageError::NotInitialized)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    type Tx = SqliteTx;

    async fn capabilities(&self) -> Result<VectorCapabilities, StorageError> {
        let pool = self.pool.clone();
        blocking(move || schema::probe_capabilities(&*get_conn(&pool)?)).await
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
        let (pool, names, cfg) = (self.pool.clone(), Arc::clone(&self.names), *config);
        blocking(move || schema::initialize(&*get_conn(&pool)?, &names, &cfg)).await?;
        // A concurrent initialize with the same config may have won the race.
        let _ = self.config.set(*config);
        Ok(())
    }

    async fn begin(&self) -> Result<SqliteTx, StorageError> {
        SqliteTx::begin(self.pool.clone(), Arc::clone(&self.names), self.config()?).await
    }

    async fn query_closest(&self, query: &ClosestQuery) -> Result<Vec<ClosestMatch>, StorageError> {
        let config = self.config()?;
        crate::traits::check_dimensions(&config, &query.embedding)?;
        let (pool, names, query) = (self.pool.clone(), Arc::clone(&self.names), query.clone());
        blocking(move || search::query_closest(&*get_conn(&pool)?, &names, &query)).await
    }

    async fn count_vectors(&self, context: i64, id: Option<i64>) -> Result<u64, StorageError> {
        self.config()?;
        let (pool, names) = (self.pool.clone(), Arc::clone(&self.names));
        blocking(move || search::count_vectors(&*get_conn(&pool)?, &names, context, id)).await
    }

    async fn fetch_vectors(&self, context: i64) -> Result<Vec<StoredVector>, StorageError> {
        self.config()?;
        let (pool, names) = (self.pool.clone(), Arc::clone(&self.names));
        blocking(move || search::fetch_vectors(&*get_conn(&pool)?, &names, context)).await
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StorageError> {
        let (pool, names) = (self.pool.clone(), Arc::clone(&self.names));
        blocking(move || schema::list_indexes(&*get_conn(&pool)?, &names)).await
    }
}
