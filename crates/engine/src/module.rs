//! Host-facing facade: config, schema setup, queries and the event sink.

use std::sync::Arc;

use ledger_vectordb_core::{InputError, VectorDbConfig};
use ledger_vectordb_storage::{StorageBackend, VectorStore};
use serde_json::Value;

use crate::error::EngineError;
use crate::event_sink::VectorDbEventSink;
use crate::query_engine::QueryEngine;
use crate::registry::QueryRegistry;

pub const QUERY_CLOSEST_OBJECTS: &str = "query_closest_objects";

pub struct VectorDbModule {
    config: VectorDbConfig,
    storage: Arc<StorageBackend>,
    engine: QueryEngine,
}

impl VectorDbModule {
    #[must_use]
    pub fn new(
        config: VectorDbConfig,
        storage: Arc<StorageBackend>,
        registry: Arc<QueryRegistry>,
    ) -> Self {
        let engine = QueryEngine::new(Arc::clone(&storage), config, registry);
        Self { config, storage, engine }
    }

    /// Build from the chain's raw configuration (`vector_db_extension` block).
    pub fn from_raw_config(
        raw: &Value,
        storage: Arc<StorageBackend>,
        registry: Arc<QueryRegistry>,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(VectorDbConfig::from_raw_config(raw)?, storage, registry))
    }

    #[must_use]
    pub fn config(&self) -> &VectorDbConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<StorageBackend> {
        &self.storage
    }

    /// Provision the table and indexes. Safe on every start.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        self.storage.initialize(&self.config).await?;
        tracing::info!(
            backend = self.storage.backend_name(),
            dimensions = self.config.dimensions,
            precision = %self.config.precision,
            "vector db module initialized"
        );
        Ok(())
    }

    pub async fn query(&self, name: &str, args: &Value) -> Result<Value, EngineError> {
        match name {
            QUERY_CLOSEST_OBJECTS => self.engine.query_closest_objects(args).await,
            other => Err(InputError::UnknownQuery(other.to_owned()).into()),
        }
    }

    #[must_use]
    pub fn event_sink(&self) -> VectorDbEventSink {
        VectorDbEventSink::new(self.config)
    }
}
