//! Row and query shapes shared between storage and the query engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embedding::Embedding;

/// One stored row. `(context, id)` is not unique.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub context: i64,
    pub id: i64,
    pub embedding: Embedding,
}

/// A nearest-neighbor hit: the row id and its cosine distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestMatch {
    pub id: i64,
    pub distance: f64,
}

/// Bounded, thresholded top-K request within one context.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestQuery {
    pub context: i64,
    pub embedding: Embedding,
    /// Distance ceiling applied after the candidate set is materialized.
    pub max_distance: f64,
    /// Size of the candidate set retrieved from the index.
    pub max_results: usize,
}

/// Secondary query to run over the nearest-neighbor results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTemplate {
    #[serde(rename = "type")]
    pub query_type: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl QueryTemplate {
    #[must_use]
    pub fn new(query_type: impl Into<String>) -> Self {
        Self { query_type: query_type.into(), args: Map::new() }
    }
}
