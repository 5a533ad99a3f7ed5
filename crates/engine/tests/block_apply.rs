#![allow(clippy::unwrap_used)]

mod common;

use common::{create_module, delete, store};
use ledger_vectordb_engine::{BlockEvent, BlockReport, EngineError, EventOutcome, VectorDbEventSink};
use ledger_vectordb_storage::{VectorStore, VectorTx};
use serde_json::json;

#[tokio::test]
async fn store_then_delete_leaves_zero_rows() {
    let (module, _registry, _dir) = create_module(3).await;
    let sink = module.event_sink();

    let report = sink.apply_block(module.storage().as_ref(), &[store(0, 1, "[1,2,3]")]).await.unwrap();
    assert_eq!(report, BlockReport { stored: 1, deleted: 0 });
    assert_eq!(module.storage().count_vectors(0, Some(1)).await.unwrap(), 1);

    let report = sink.apply_block(module.storage().as_ref(), &[delete(0, 1)]).await.unwrap();
    assert_eq!(report, BlockReport { stored: 0, deleted: 1 });
    assert_eq!(module.storage().count_vectors(0, Some(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_without_match_is_noop() {
    let (module, _registry, _dir) = create_module(3).await;
    let sink = module.event_sink();
    sink.apply_block(module.storage().as_ref(), &[store(0, 1, "[1,2,3]")]).await.unwrap();

    let report = sink.apply_block(module.storage().as_ref(), &[delete(0, 2)]).await.unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(module.storage().count_vectors(0, None).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_tag_rolls_back_whole_block() {
    let (module, _registry, _dir) = create_module(3).await;
    let events = [
        store(0, 1, "[1,2,3]"),
        BlockEvent::new("update_vector", json!({ "context": 0, "id": 1 })),
    ];

    let err = module.event_sink().apply_block(module.storage().as_ref(), &events).await.unwrap_err();
    assert!(matches!(err, EngineError::Integration(_)), "got {err:?}");
    assert!(err.is_fatal());
    assert_eq!(module.storage().count_vectors(0, None).await.unwrap(), 0);
}

#[tokio::test]
async fn bad_payload_is_user_error_and_rolls_back() {
    let (module, _registry, _dir) = create_module(3).await;
    let events = [store(0, 1, "[1,2,3]"), store(0, 2, "[1,2]")];

    let err = module.event_sink().apply_block(module.storage().as_ref(), &events).await.unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(module.storage().count_vectors(0, None).await.unwrap(), 0);

    let missing = [BlockEvent::new("store_vector", json!({ "id": 1, "vector": "[1,2,3]" }))];
    let err = module.event_sink().apply_block(module.storage().as_ref(), &missing).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid input: No context argument supplied");
}

#[tokio::test]
async fn process_event_joins_callers_transaction() {
    let (module, _registry, _dir) = create_module(3).await;
    let sink = module.event_sink();
    let mut tx = module.storage().begin().await.unwrap();

    let outcome = sink
        .process_event(&mut tx, "store_vector", &json!({ "context": 5, "id": 1, "vector": "[0,1,0]" }))
        .await
        .unwrap();
    assert_eq!(outcome, EventOutcome::Stored);
    assert_eq!(module.storage().count_vectors(5, None).await.unwrap(), 0);

    tx.rollback().await.unwrap();
    assert_eq!(module.storage().count_vectors(5, None).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicates_are_all_deleted() {
    let (module, _registry, _dir) = create_module(3).await;
    let sink = module.event_sink();
    let events = [store(0, 1, "[1,2,3]"), store(0, 1, "[3,2,1]"), delete(0, 1)];

    let report = sink.apply_block(module.storage().as_ref(), &events).await.unwrap();
    assert_eq!(report, BlockReport { stored: 2, deleted: 2 });
    assert_eq!(module.storage().count_vectors(0, None).await.unwrap(), 0);
}

#[tokio::test]
async fn every_advertised_tag_is_accepted() {
    let (module, _registry, _dir) = create_module(3).await;
    let sink = module.event_sink();
    assert_eq!(VectorDbEventSink::EVENT_TAGS, ["store_vector", "delete_vector"]);

    let payload = json!({ "context": 0, "id": 1, "vector": "[1,2,3]" });
    let mut tx = module.storage().begin().await.unwrap();
    let mut outcomes = Vec::new();
    for tag in VectorDbEventSink::EVENT_TAGS {
        outcomes.push(sink.process_event(&mut tx, tag, &payload).await.unwrap());
    }
    tx.commit().await.unwrap();

    assert_eq!(outcomes, vec![EventOutcome::Stored, EventOutcome::Deleted(1)]);
    assert_eq!(module.storage().count_vectors(0, None).await.unwrap(), 0);
}
