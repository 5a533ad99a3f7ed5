//! Integration tests for PgVectorStore.
//! Run with: DATABASE_URL=... cargo test -p ledger-vectordb-storage --features postgres -- --ignored pg_

#![cfg(feature = "postgres")]
#![allow(clippy::unwrap_used, reason = "integration test code")]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ledger_vectordb_core::{
    ClosestMatch, ClosestQuery, Embedding, EmbeddingPrecision, VectorDbConfig,
};
use ledger_vectordb_storage::{PgVectorStore, StorageError, VectorStore, VectorTx};

static NEXT_CHAIN: AtomicU64 = AtomicU64::new(0);

/// Every test gets its own table so runs never interfere.
fn unique_chain_iid() -> u64 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    u64::from(nanos) * 1000 + NEXT_CHAIN.fetch_add(1, Ordering::Relaxed)
}

async fn connect(chain_iid: u64) -> PgVectorStore {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgVectorStore integration tests");
    PgVectorStore::new(&url, chain_iid, Some(100)).await.expect("Failed to connect to PostgreSQL")
}

async fn create_pg_store(config: &VectorDbConfig) -> PgVectorStore {
    let store = connect(unique_chain_iid()).await;
    store.initialize(config).await.unwrap();
    store
}

async fn drop_table(store: &PgVectorStore) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", store.table_names().table))
        .execute(store.pool())
        .await
        .unwrap();
}

fn vector(literal: &str) -> Embedding {
    Embedding::parse(literal).unwrap()
}

async fn store_committed(store: &PgVectorStore, context: i64, rows: &[(i64, &str)]) {
    let mut tx = store.begin().await.unwrap();
    for (id, literal) in rows {
        tx.insert_vector(context, *id, &vector(literal)).await.unwrap();
    }
    tx.commit().await.unwrap();
}

fn query(literal: &str, max_distance: f64, max_results: usize) -> ClosestQuery {
    ClosestQuery { context: 0, embedding: vector(literal), max_distance, max_results }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_initialize_is_idempotent_and_drops_legacy_index() {
    let store = create_pg_store(&VectorDbConfig::new(3).unwrap()).await;
    let names = store.table_names().clone();
    sqlx::query(&format!(
        "CREATE INDEX {} ON {} USING hnsw (embedding halfvec_l2_ops)",
        names.legacy_l2_index, names.table
    ))
    .execute(store.pool())
    .await
    .unwrap();

    store.initialize(&VectorDbConfig::new(3).unwrap()).await.unwrap();
    let mut expected = vec![names.context_id_index.clone(), names.cosine_index.clone()];
    expected.sort();
    assert_eq!(store.list_indexes().await.unwrap(), expected);
    assert!(store.capabilities().await.unwrap().ann_index);

    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_exact_match_and_bounded_ceiling() {
    let store = create_pg_store(&VectorDbConfig::new(3).unwrap()).await;
    store_committed(
        &store,
        0,
        &[(1, "[1,2,3]"), (2, "[1,4,3]"), (3, "[7,4,3]"), (4, "[9,8,4]"), (5, "[2,3,7]")],
    )
    .await;

    let exact = store.query_closest(&query("[1,2,3]", 0.0, 10)).await.unwrap();
    assert_eq!(exact, vec![ClosestMatch { id: 1, distance: 0.0 }]);

    let wide = store.query_closest(&query("[1,2,3]", 1.0, 3)).await.unwrap();
    assert_eq!(wide.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 5, 2]);
    let tight = store.query_closest(&query("[1,2,3]", 0.02, 3)).await.unwrap();
    assert_eq!(tight.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 5]);

    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_delete_and_rollback() {
    let store = create_pg_store(&VectorDbConfig::new(3).unwrap()).await;
    store_committed(&store, 0, &[(1, "[1,2,3]"), (1, "[3,2,1]")]).await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_vector(0, 2, &vector("[1,1,1]")).await.unwrap();
    assert_eq!(store.count_vectors(0, Some(2)).await.unwrap(), 0);
    tx.rollback().await.unwrap();
    assert_eq!(store.count_vectors(0, Some(2)).await.unwrap(), 0);

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.delete_vectors(0, 1).await.unwrap(), 2);
    assert_eq!(tx.delete_vectors(0, 1).await.unwrap(), 0);
    tx.commit().await.unwrap();
    assert_eq!(store.count_vectors(0, None).await.unwrap(), 0);

    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_dimension_mismatch_and_schema_conflict() {
    let chain_iid = unique_chain_iid();
    let store = connect(chain_iid).await;
    store.initialize(&VectorDbConfig::new(3).unwrap()).await.unwrap();
    let mut tx = store.begin().await.unwrap();
    let err = tx.insert_vector(0, 1, &vector("[1,2]")).await.unwrap_err();
    assert!(matches!(err, StorageError::DimensionMismatch { expected: 3, actual: 2 }));
    drop(tx);

    let other = connect(chain_iid).await;
    let single = VectorDbConfig::with_precision(3, EmbeddingPrecision::Single).unwrap();
    let err = other.initialize(&single).await.unwrap_err();
    assert!(matches!(err, StorageError::SchemaConflict(_)), "got {err:?}");

    drop_table(&store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_fetch_round_trips_literals() {
    let store = create_pg_store(&VectorDbConfig::new(3).unwrap()).await;
    store_committed(&store, 4, &[(2, "[0.5,-1,3]"), (1, "[1,2,3]")]).await;

    let rows = store.fetch_vectors(4).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(rows[1].embedding, vector("[0.5,-1,3]"));

    drop_table(&store).await;
}
