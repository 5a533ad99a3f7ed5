use anyhow::Result;
use ledger_vectordb_storage::VectorStore;
use serde_json::json;

use super::{Target, open_module, print_json};

pub(crate) async fn run_init(target: &Target) -> Result<()> {
    let module = open_module(target).await?;
    let storage = module.storage();
    let capabilities = storage.capabilities().await?;
    print_json(&json!({
        "backend": storage.backend_name(),
        "dimensions": module.config().dimensions,
        "precision": module.config().precision,
        "ann_index": capabilities.ann_index,
        "indexes": storage.list_indexes().await?,
    }))
}
