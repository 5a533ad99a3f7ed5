//! Typed error enum for the storage layer.
//!
//! Lets callers tell infrastructure failures (connectivity, constraint
//! violations) apart from missing vector capabilities and schema conflicts,
//! instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine lacks the vector type, cosine operator or top-K primitive.
    /// Fatal at startup; never retried.
    #[error("vector capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The existing table disagrees with the configured embedding column.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),

    /// A store/delete/query arrived before `initialize`.
    #[error("vector store is not initialized")]
    NotInitialized,

    /// Embedding length differs from the table's dimensionality.
    #[error("dimension mismatch: table expects {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Check/unique/data constraint rejected the row.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The transaction was already committed or rolled back.
    #[error("transaction is closed")]
    TransactionClosed,

    /// SQL / connection / timeout failure (PostgreSQL).
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// SQL failure (SQLite).
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// Could not obtain a pooled SQLite connection.
    #[cfg(feature = "sqlite")]
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Filesystem failure preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking worker panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(String),

    /// Row data could not be decoded into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying by the host).
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Database(e) => matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            #[cfg(feature = "sqlite")]
            Self::Pool(_) => true,
            _ => false,
        }
    }

    /// Whether startup must abort rather than continue without the store.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, Self::CapabilityUnavailable(_) | Self::SchemaConflict(_))
    }
}

/// Custom `From<sqlx::Error>` rather than a blanket `#[from]`.
///
/// - SQLSTATE class 22 (data exception, e.g. pgvector dimension checks) and
///   class 23 (integrity constraint) → `Constraint`
/// - Everything else → `Database`
#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().is_some_and(|c| c.starts_with("22") || c.starts_with("23")) =>
            {
                Self::Constraint(db_err.message().to_owned())
            },
            _ => Self::Database(err),
        }
    }
}

/// Constraint failures map to `Constraint`; everything else to `Sqlite`.
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
            },
            _ => Self::Sqlite(err),
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> StorageError {
        StorageError::from(rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None))
    }

    #[test]
    fn busy_and_locked_are_transient() {
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_BUSY).is_transient());
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED).is_transient());
        assert!(!sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT).is_transient());
    }

    #[test]
    fn logical_failures_are_not_transient() {
        assert!(!StorageError::NotInitialized.is_transient());
        assert!(!StorageError::SchemaConflict("dims".into()).is_transient());
        assert!(!sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT).is_transient());
        assert!(matches!(
            sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT),
            StorageError::Constraint(_)
        ));
    }
}
