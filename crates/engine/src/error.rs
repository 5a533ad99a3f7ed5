//! Typed error enum for the engine layer.
//!
//! Separates caller mistakes (rejected transaction or query) from
//! integration faults (fatal to the block) and storage failures, so the
//! host can match on the failure mode instead of downcasting.

use ledger_vectordb_core::InputError;
use ledger_vectordb_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed argument, bad vector literal, unknown query.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The host routed something the engine never registered for.
    #[error("integration: {0}")]
    Integration(String),

    #[error(transparent)]
    Storage(StorageError),

    /// A chained query handler failed.
    #[error("query handler {name} failed")]
    Handler {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EngineError {
    /// Whether the caller should be told their input was rejected.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Whether the block (or startup) must abort.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Integration(_) => true,
            Self::Storage(e) => e.is_fatal_at_startup(),
            _ => false,
        }
    }

    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// A dimension mismatch caught by storage is still the caller's mistake.
impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DimensionMismatch { expected, actual } => {
                Self::InvalidInput(InputError::DimensionMismatch { expected, actual })
            },
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_dimension_mismatch_is_user_error() {
        let err = EngineError::from(StorageError::DimensionMismatch { expected: 3, actual: 2 });
        assert!(err.is_user_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn classifies_failures() {
        assert!(EngineError::Integration("x".into()).is_fatal());
        assert!(EngineError::from(StorageError::CapabilityUnavailable("x".into())).is_fatal());
        assert!(!EngineError::from(StorageError::NotInitialized).is_user_error());
        assert!(EngineError::from(InputError::MissingArgument("id")).is_user_error());
    }

    #[test]
    fn storage_errors_keep_their_own_message() {
        let err = EngineError::from(StorageError::NotInitialized);
        assert_eq!(err.to_string(), "vector store is not initialized");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn busy_database_is_transient() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".into()),
        );
        assert!(EngineError::from(StorageError::from(busy)).is_transient());
        assert!(!EngineError::from(StorageError::NotInitialized).is_transient());
        assert!(!EngineError::Integration("x".into()).is_transient());
    }
}
