//! Unified vector store with enum dispatch.

#[cfg(feature = "sqlite")]
use std::path::Path;

use async_trait::async_trait;
use ledger_vectordb_core::{
    ClosestMatch, ClosestQuery, Embedding, StoreSettings, StoredVector, VectorDbConfig,
};

use crate::error::StorageError;
use crate::traits::{VectorCapabilities, VectorStore, VectorTx};

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => s.$method($($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => s.$method($($arg),*).await,
        }
    };
}

macro_rules! dispatch_tx {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            BackendTx::Sqlite(tx) => tx.$method($($arg),*).await,
            #[cfg(feature = "postgres")]
            BackendTx::Postgres(tx) => tx.$method($($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteVectorStore),
    #[cfg(feature = "postgres")]
    Postgres(crate::PgVectorStore),
}

impl StorageBackend {
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &Path, chain_iid: u64, pool_size: u32) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::SqliteVectorStore::new(db_path, chain_iid, pool_size)?))
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(
        database_url: &str,
        chain_iid: u64,
        ef_search: Option<u32>,
    ) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::PgVectorStore::new(database_url, chain_iid, ef_search).await?))
    }

    /// PostgreSQL when a database URL is configured, otherwise the SQLite file.
    pub async fn from_settings(
        settings: &StoreSettings,
        default_sqlite_path: &std::path::Path,
    ) -> Result<Self, StorageError> {
        #[cfg(feature = "postgres")]
        if let Some(url) = settings.database_url.as_deref() {
            return Self::new_postgres(url, settings.chain_iid, settings.hnsw_ef_search).await;
        }
        Self::open_local(settings, default_sqlite_path)
    }

    #[cfg(feature = "sqlite")]
    fn open_local(settings: &StoreSettings, default_path: &Path) -> Result<Self, StorageError> {
        let path = settings.sqlite_path.as_deref().unwrap_or(default_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::new_sqlite(path, settings.chain_iid, settings.pool_size)
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_local(
        _settings: &StoreSettings,
        _default_path: &std::path::Path,
    ) -> Result<Self, StorageError> {
        Err(StorageError::CapabilityUnavailable(
            "no database URL configured and SQLite support is disabled".to_owned(),
        ))
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

/// Transaction of whichever backend opened it.
#[derive(Debug)]
pub enum BackendTx {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteTx),
    #[cfg(feature = "postgres")]
    Postgres(crate::PgTx),
}

#[async_trait]
impl VectorStore for StorageBackend {
    type Tx = BackendTx;

    async fn capabilities(&self) -> Result<VectorCapabilities, StorageError> {
        dispatch!(self, capabilities())
    }

    async fn initialize(&self, config: &VectorDbConfig) -> Result<(), StorageError> {
        dispatch!(self, initialize(config))
    }

    async fn begin(&self) -> Result<BackendTx, StorageError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(s) => Ok(BackendTx::Sqlite(s.begin().await?)),
            #[cfg(feature = "postgres")]
            Self::Postgres(s) => Ok(BackendTx::Postgres(s.begin().await?)),
        }
    }

    async fn query_closest(&self, query: &ClosestQuery) -> Result<Vec<ClosestMatch>, StorageError> {
        dispatch!(self, query_closest(query))
    }

    async fn count_vectors(&self, context: i64, id: Option<i64>) -> Result<u64, StorageError> {
        dispatch!(self, count_vectors(context, id))
    }

    async fn fetch_vectors(&self, context: i64) -> Result<Vec<StoredVector>, StorageError> {
        dispatch!(self, fetch_vectors(context))
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StorageError> {
        dispatch!(self, list_indexes())
    }
}

#[async_trait]
impl VectorTx for BackendTx {
    async fn insert_vector(
        &mut self,
        context: i64,
        id: i64,
        embedding: &Embedding,
    ) -> Result<(), StorageError> {
        dispatch_tx!(self, insert_vector(context, id, embedding))
    }

    async fn delete_vectors(&mut self, context: i64, id: i64) -> Result<u64, StorageError> {
        dispatch_tx!(self, delete_vectors(context, id))
    }

    async fn commit(self) -> Result<(), StorageError> {
        dispatch_tx!(self, commit())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        dispatch_tx!(self, rollback())
    }
}
