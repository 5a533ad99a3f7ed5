//! Applies store/delete events inside the block's transaction.

use ledger_vectordb_core::VectorDbConfig;
use ledger_vectordb_storage::{VectorStore, VectorTx};
use serde_json::Value;

use crate::error::EngineError;
use crate::event::{BlockEvent, EventTag, VectorEvent};

/// What one applied event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Stored,
    Deleted(u64),
}

/// Totals for one block of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub stored: u64,
    pub deleted: u64,
}

/// Event sink for the vector tags. Holds no state besides the config; the
/// transaction is passed to every call.
#[derive(Debug, Clone, Copy)]
pub struct VectorDbEventSink {
    config: VectorDbConfig,
}

impl VectorDbEventSink {
    /// Tags the host should route to this sink.
    pub const EVENT_TAGS: [&'static str; 2] =
        [EventTag::StoreVector.as_str(), EventTag::DeleteVector.as_str()];

    #[must_use]
    pub fn new(config: VectorDbConfig) -> Self {
        Self { config }
    }

    /// Decode and apply one emitted event.
    pub async fn process_event<T: VectorTx>(
        &self,
        tx: &mut T,
        tag: &str,
        payload: &Value,
    ) -> Result<EventOutcome, EngineError> {
        let tag: EventTag = tag.parse()?;
        let event = VectorEvent::decode(tag, payload, self.config.dimensions)?;
        self.apply(tx, &event).await
    }

    pub async fn apply<T: VectorTx>(
        &self,
        tx: &mut T,
        event: &VectorEvent,
    ) -> Result<EventOutcome, EngineError> {
        match event {
            VectorEvent::Store { context, id, embedding } => {
                tx.insert_vector(*context, *id, embedding).await?;
                tracing::debug!(context, id, "Stored vector");
                Ok(EventOutcome::Stored)
            },
            VectorEvent::Delete { context, id } => {
                let deleted = tx.delete_vectors(*context, *id).await?;
                tracing::debug!(context, id, deleted, "Deleted {deleted} vectors");
                Ok(EventOutcome::Deleted(deleted))
            },
        }
    }

    /// One block as a unit of work: commit if every event applies, otherwise
    /// roll back and return the first error.
    pub async fn apply_block<S: VectorStore>(
        &self,
        store: &S,
        events: &[BlockEvent],
    ) -> Result<BlockReport, EngineError> {
        let mut tx = store.begin().await?;
        let mut report = BlockReport::default();
        for (index, event) in events.iter().enumerate() {
            match self.process_event(&mut tx, &event.tag, &event.data).await {
                Ok(EventOutcome::Stored) => report.stored += 1,
                Ok(EventOutcome::Deleted(n)) => report.deleted += n,
                Err(e) => {
                    tracing::warn!(index, tag = %event.tag, error = %e, "block rejected, rolling back");
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(error = %rollback, "rollback failed");
                    }
                    return Err(e);
                },
            }
        }
        tx.commit().await?;
        tracing::info!(
            events = events.len(),
            stored = report.stored,
            deleted = report.deleted,
            "block applied"
        );
        Ok(report)
    }
}
