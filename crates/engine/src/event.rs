//! Mutation events emitted by the host's transaction layer.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ledger_vectordb_core::{Embedding, InputResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::{as_object, required_i64, required_vector};
use crate::error::EngineError;

pub const EVENT_STORE_VECTOR: &str = "store_vector";
pub const EVENT_DELETE_VECTOR: &str = "delete_vector";

/// The closed set of event tags the sink is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    StoreVector,
    DeleteVector,
}

impl EventTag {
    pub const ALL: [Self; 2] = [Self::StoreVector, Self::DeleteVector];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StoreVector => EVENT_STORE_VECTOR,
            Self::DeleteVector => EVENT_DELETE_VECTOR,
        }
    }
}

impl Display for EventTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Any other tag means the host routed an event the sink never registered
/// for, which is an integration fault rather than bad user input.
impl FromStr for EventTag {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EVENT_STORE_VECTOR => Ok(Self::StoreVector),
            EVENT_DELETE_VECTOR => Ok(Self::DeleteVector),
            other => Err(EngineError::Integration(format!("Unrecognized event: {other}"))),
        }
    }
}

/// A decoded, validated mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorEvent {
    Store { context: i64, id: i64, embedding: Embedding },
    Delete { context: i64, id: i64 },
}

impl VectorEvent {
    /// Decode a JSON payload for `tag`, checking vector length against `dimensions`.
    pub fn decode(tag: EventTag, payload: &Value, dimensions: usize) -> InputResult<Self> {
        let args = as_object(payload, "event payload")?;
        let context = required_i64(args, "context")?;
        match tag {
            EventTag::StoreVector => {
                let embedding = required_vector(args, "vector", dimensions)?;
                let id = required_i64(args, "id")?;
                Ok(Self::Store { context, id, embedding })
            },
            EventTag::DeleteVector => Ok(Self::Delete { context, id: required_i64(args, "id")? }),
        }
    }
}

/// Raw event as it appears in a block: tag plus JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEvent {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub data: Value,
}

impl BlockEvent {
    pub fn new(tag: impl Into<String>, data: Value) -> Self {
        Self { tag: tag.into(), data }
    }
}
