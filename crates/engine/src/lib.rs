//! Engine layer for the ledger vector store
//!
//! Decodes and applies mutation events, answers nearest-neighbor queries and
//! chains their results into named query handlers.

mod args;
mod closest_query;
mod error;
mod event;
mod event_sink;
mod module;
mod query_engine;
mod registry;

pub use closest_query::{CLOSEST_RESULTS_ARG, ClosestObjectsQuery};
pub use error::EngineError;
pub use event::{BlockEvent, EVENT_DELETE_VECTOR, EVENT_STORE_VECTOR, EventTag, VectorEvent};
pub use event_sink::{BlockReport, EventOutcome, VectorDbEventSink};
pub use module::{QUERY_CLOSEST_OBJECTS, VectorDbModule};
pub use query_engine::QueryEngine;
pub use registry::{FnQueryHandler, QueryHandler, QueryRegistry};
