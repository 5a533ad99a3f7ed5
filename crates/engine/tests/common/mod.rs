#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use ledger_vectordb_engine::{BlockEvent, QueryRegistry, VectorDbModule};
use ledger_vectordb_storage::StorageBackend;
use serde_json::{Value, json};
use tempfile::TempDir;

pub async fn create_module(dimensions: usize) -> (VectorDbModule, Arc<QueryRegistry>, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = StorageBackend::new_sqlite(&dir.path().join("vectors.db"), 0, 4).unwrap();
    let registry = Arc::new(QueryRegistry::new());
    let raw = json!({ "vector_db_extension": { "dimensions": dimensions } });
    let module =
        VectorDbModule::from_raw_config(&raw, Arc::new(storage), Arc::clone(&registry)).unwrap();
    module.initialize().await.unwrap();
    (module, registry, dir)
}

pub fn store(context: i64, id: i64, vector: &str) -> BlockEvent {
    BlockEvent::new("store_vector", json!({ "context": context, "id": id, "vector": vector }))
}

pub fn delete(context: i64, id: i64) -> BlockEvent {
    BlockEvent::new("delete_vector", json!({ "context": context, "id": id }))
}

pub fn ids(result: &Value) -> Vec<i64> {
    result.as_array().unwrap().iter().map(|m| m["id"].as_i64().unwrap()).collect()
}
