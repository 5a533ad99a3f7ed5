//! Vector capability boundary.
//!
//! Any engine that stores fixed-length float vectors, computes cosine
//! distance and answers top-K nearest-neighbor requests can back the store.

use async_trait::async_trait;
use ledger_vectordb_core::{ClosestMatch, ClosestQuery, Embedding, StoredVector, VectorDbConfig};

use crate::error::StorageError;

/// What the underlying engine can do, probed before schema initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorCapabilities {
    /// Fixed-length float vector storage.
    pub vector_type: bool,
    /// Cosine-distance operator.
    pub cosine_distance: bool,
    /// Top-K nearest-neighbor retrieval.
    pub top_k: bool,
    /// Top-K is served by an approximate index rather than an exact scan.
    pub ann_index: bool,
}

impl VectorCapabilities {
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.vector_type {
            missing.push("vector type");
        }
        if !self.cosine_distance {
            missing.push("cosine distance operator");
        }
        if !self.top_k {
            missing.push("top-k search");
        }
        missing
    }

    pub fn ensure(&self) -> Result<(), StorageError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StorageError::CapabilityUnavailable(missing.join(", ")))
        }
    }
}

/// A vector table plus the operations the engine needs from it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    type Tx: VectorTx;

    /// Probe the engine's vector support.
    async fn capabilities(&self) -> Result<VectorCapabilities, StorageError>;

    /// Create the table and indexes if absent. Idempotent.
    ///
    /// Fails with `CapabilityUnavailable` when the engine lacks vector support
    /// and with `SchemaConflict` when an existing table disagrees with `config`.
    async fn initialize(&self, config: &VectorDbConfig) -> Result<(), StorageError>;

    /// Open a write transaction (one block's unit of work).
    async fn begin(&self) -> Result<Self::Tx, StorageError>;

    /// Two-phase nearest-neighbor search on a read connection.
    ///
    /// Retrieves the `max_results` closest rows of the context first, then
    /// drops those farther than `max_distance`. Ascending by distance, ties by id.
    async fn query_closest(&self, query: &ClosestQuery) -> Result<Vec<ClosestMatch>, StorageError>;

    /// Count committed rows in a context, optionally for one id.
    async fn count_vectors(&self, context: i64, id: Option<i64>) -> Result<u64, StorageError>;

    /// All committed rows of a context, ordered by id.
    async fn fetch_vectors(&self, context: i64) -> Result<Vec<StoredVector>, StorageError>;

    /// Names of the indexes currently defined on the vector table.
    async fn list_indexes(&self) -> Result<Vec<String>, StorageError>;
}

/// Open write transaction. Dropping it without `commit` rolls back.
#[async_trait]
pub trait VectorTx: Send {
    async fn insert_vector(
        &mut self,
        context: i64,
        id: i64,
        embedding: &Embedding,
    ) -> Result<(), StorageError>;

    /// Remove every row matching `(context, id)`; returns the removed count.
    async fn delete_vectors(&mut self, context: i64, id: i64) -> Result<u64, StorageError>;

    async fn commit(self) -> Result<(), StorageError>;

    async fn rollback(self) -> Result<(), StorageError>;
}

/// Shared check run by every backend before touching the table.
pub(crate) fn check_dimensions(
    config: &VectorDbConfig,
    embedding: &Embedding,
) -> Result<(), StorageError> {
    if embedding.dimensions() == config.dimensions {
        Ok(())
    } else {
        Err(StorageError::DimensionMismatch {
            expected: config.dimensions,
            actual: embedding.dimensions(),
        })
    }
}
