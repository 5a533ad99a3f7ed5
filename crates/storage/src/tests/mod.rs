//! Test utilities and module declarations for storage tests.

use crate::{SqliteVectorStore, VectorStore, VectorTx};
use ledger_vectordb_core::{Embedding, VectorDbConfig};
use tempfile::TempDir;


#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (SqliteVectorStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = SqliteVectorStore::new(&db_path, 0, 4).unwrap();
    (storage, temp_dir)
}

/// Storage with a 3-dimensional table already initialized.
#[expect(clippy::unwrap_used, reason = "test code")]
pub async fn create_initialized_storage() -> (SqliteVectorStore, TempDir) {
    let (storage, dir) = create_test_storage();
    storage.initialize(&VectorDbConfig::new(3).unwrap()).await.unwrap();
    (storage, dir)
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn vector(literal: &str) -> Embedding {
    Embedding::parse(literal).unwrap()
}

/// Insert and commit in one transaction.
#[expect(clippy::unwrap_used, reason = "test code")]
pub async fn store_committed(storage: &SqliteVectorStore, context: i64, rows: &[(i64, &str)]) {
    let mut tx = storage.begin().await.unwrap();
    for (id, literal) in rows {
        tx.insert_vector(context, *id, &vector(literal)).await.unwrap();
    }
    tx.commit().await.unwrap();
}
