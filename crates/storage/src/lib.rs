//! Storage layer for the ledger vector store
//!
//! One `VectorStore` capability boundary with two implementations:
//! PostgreSQL + pgvector (HNSW cosine index) and SQLite + sqlite-vec
//! (exact cosine scan for local nodes and tests).

mod backend;
pub mod error;
#[cfg(feature = "postgres")]
mod pg_store;
pub mod schema;
#[cfg(feature = "sqlite")]
mod sqlite_store;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;

pub use backend::{BackendTx, StorageBackend};
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_store::{PgTx, PgVectorStore};
pub use schema::TableNames;
#[cfg(feature = "sqlite")]
pub use sqlite_store::{SqliteTx, SqliteVectorStore, init_sqlite_vec};
pub use traits::{VectorCapabilities, VectorStore, VectorTx};
