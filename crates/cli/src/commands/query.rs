use anyhow::Result;
use ledger_vectordb_engine::QUERY_CLOSEST_OBJECTS;
use ledger_vectordb_storage::VectorStore;
use serde_json::json;

use super::{Target, open_module, print_json};

pub(crate) async fn run_query(
    target: &Target,
    context: i64,
    vector: String,
    max_distance: String,
    max_vectors: Option<i64>,
) -> Result<()> {
    let module = open_module(target).await?;
    let mut args = json!({ "context": context, "q_vector": vector, "max_distance": max_distance });
    if let Some(max_vectors) = max_vectors {
        args["max_vectors"] = json!(max_vectors);
    }
    let result = module.query(QUERY_CLOSEST_OBJECTS, &args).await?;
    print_json(&result)
}

pub(crate) async fn run_count(target: &Target, context: i64, id: Option<i64>) -> Result<()> {
    let module = open_module(target).await?;
    let count = module.storage().count_vectors(context, id).await?;
    print_json(&json!({ "context": context, "id": id, "count": count }))
}
