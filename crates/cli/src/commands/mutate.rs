use std::path::Path;

use anyhow::{Context, Result};
use ledger_vectordb_engine::{BlockEvent, EVENT_DELETE_VECTOR, EVENT_STORE_VECTOR, VectorDbModule};
use serde_json::json;

use super::{Target, open_module, print_json};

async fn apply(module: &VectorDbModule, events: &[BlockEvent]) -> Result<()> {
    let report = module.event_sink().apply_block(module.storage().as_ref(), events).await?;
    print_json(&json!({ "stored": report.stored, "deleted": report.deleted }))
}

pub(crate) async fn run_store(target: &Target, context: i64, id: i64, vector: String) -> Result<()> {
    let module = open_module(target).await?;
    let event =
        BlockEvent::new(EVENT_STORE_VECTOR, json!({ "context": context, "id": id, "vector": vector }));
    apply(&module, &[event]).await
}

pub(crate) async fn run_delete(target: &Target, context: i64, id: i64) -> Result<()> {
    let module = open_module(target).await?;
    let event = BlockEvent::new(EVENT_DELETE_VECTOR, json!({ "context": context, "id": id }));
    apply(&module, &[event]).await
}

pub(crate) async fn run_apply(target: &Target, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading events from {}", path.display()))?;
    let events: Vec<BlockEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing events in {}", path.display()))?;
    let module = open_module(target).await?;
    apply(&module, &events).await
}
