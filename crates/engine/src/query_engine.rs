//! Two-phase nearest-neighbor queries and template chaining.

use std::sync::Arc;

use ledger_vectordb_core::{ClosestMatch, ClosestQuery, InputError, QueryTemplate, VectorDbConfig};
use ledger_vectordb_storage::{StorageBackend, VectorStore};
use serde_json::{Map, Value};

use crate::closest_query::{CLOSEST_RESULTS_ARG, ClosestObjectsQuery};
use crate::error::EngineError;
use crate::registry::QueryRegistry;

pub struct QueryEngine {
    storage: Arc<StorageBackend>,
    config: VectorDbConfig,
    registry: Arc<QueryRegistry>,
}

impl QueryEngine {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        config: VectorDbConfig,
        registry: Arc<QueryRegistry>,
    ) -> Self {
        Self { storage, config, registry }
    }

    /// Bounded top-K retrieval, then the distance ceiling.
    pub async fn closest(&self, query: &ClosestQuery) -> Result<Vec<ClosestMatch>, EngineError> {
        query.embedding.check_dimensions(self.config.dimensions)?;
        Ok(self.storage.query_closest(query).await?)
    }

    /// `query_closest_objects`: the raw `[{id, distance}]` list, or the
    /// chained handler's output when a template is given.
    pub async fn query_closest_objects(&self, args: &Value) -> Result<Value, EngineError> {
        let request = ClosestObjectsQuery::from_args(args, self.config.dimensions)?;
        let matches = self.closest(&request.query).await?;
        let results = results_to_json(&matches);
        match request.template {
            None => Ok(results),
            Some(template) => self.chain(template, results).await,
        }
    }

    /// Resolve `template.type` against the registry as it is now.
    pub async fn chain(&self, template: QueryTemplate, results: Value) -> Result<Value, EngineError> {
        let handler = self
            .registry
            .get(&template.query_type)
            .await
            .ok_or_else(|| InputError::UnknownQuery(template.query_type.clone()))?;
        let args = chained_args(results, template.args);
        tracing::debug!(query = %template.query_type, "chaining closest results");
        handler
            .handle(args)
            .await
            .map_err(|source| EngineError::Handler { name: template.query_type, source })
    }
}

fn results_to_json(matches: &[ClosestMatch]) -> Value {
    Value::Array(
        matches
            .iter()
            .map(|m| serde_json::json!({ "id": m.id, "distance": m.distance }))
            .collect(),
    )
}

/// `{closest_results: results}` plus the template's own args.
fn chained_args(results: Value, template_args: Map<String, Value>) -> Value {
    let mut args = Map::with_capacity(template_args.len() + 1);
    args.insert(CLOSEST_RESULTS_ARG.to_owned(), results);
    args.extend(template_args);
    Value::Object(args)
}
