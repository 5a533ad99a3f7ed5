//! Write transaction owning one pooled connection.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use ledger_vectordb_core::{Embedding, VectorDbConfig};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, params};
use zerocopy::IntoBytes;

use super::{PooledConn, blocking, get_conn};
use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};
use crate::traits::{VectorTx, check_dimensions};

/// Pooled connection with an open transaction.
///
/// Rolls back on drop unless the connection is already back in autocommit,
/// so a connection abandoned on the blocking pool never re-enters the r2d2
/// pool mid-transaction.
struct TxConn(PooledConn);

impl Deref for TxConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.0
    }
}

impl Drop for TxConn {
    fn drop(&mut self) {
        if self.0.is_autocommit() {
            return;
        }
        if let Err(e) = self.0.execute_batch("ROLLBACK") {
            tracing::warn!("rollback of abandoned transaction failed: {e}");
        }
    }
}

/// `BEGIN IMMEDIATE` transaction on a dedicated connection.
///
/// Readers on other pooled connections keep seeing the last committed state
/// (WAL). Dropping the handle without `commit` rolls back, including when an
/// in-flight statement future is cancelled.
pub struct SqliteTx {
    conn: Option<TxConn>,
    names: Arc<TableNames>,
    config: VectorDbConfig,
}

impl std::fmt::Debug for SqliteTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTx")
            .field("table", &self.names.table)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl SqliteTx {
    pub(crate) async fn begin(
        pool: Pool<SqliteConnectionManager>,
        names: Arc<TableNames>,
        config: VectorDbConfig,
    ) -> Result<Self, StorageError> {
        let conn = blocking(move || {
            let conn = get_conn(&pool)?;
            conn.execute_batch("BEGIN IMMEDIATE")?;
            Ok(TxConn(conn))
        })
        .await?;
        Ok(Self { conn: Some(conn), names, config })
    }

    /// Lend the connection to a blocking closure and take it back afterwards.
    async fn with_conn<F, T>(&mut self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection, &TableNames) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.take().ok_or(StorageError::TransactionClosed)?;
        let names = Arc::clone(&self.names);
        let (conn, result) = blocking(move || {
            let result = f(&conn, &names);
            Ok((conn, result))
        })
        .await?;
        self.conn = Some(conn);
        result
    }

    async fn finish(mut self, sql: &'static str) -> Result<(), StorageError> {
        let conn = self.conn.take().ok_or(StorageError::TransactionClosed)?;
        blocking(move || {
            // a failed COMMIT leaves the transaction open; TxConn rolls it back
            Ok(conn.execute_batch(sql)?)
        })
        .await
    }
}

#[async_trait]
impl VectorTx for SqliteTx {
    async fn insert_vector(
        &mut self,
        context: i64,
        id: i64,
        embedding: &Embedding,
    ) -> Result<(), StorageError> {
        check_dimensions(&self.config, embedding)?;
        let embedding = embedding.clone();
        self.with_conn(move |conn, names| {
            conn.prepare_cached(&format!(
                "INSERT INTO {table} ({COLUMN_CONTEXT}, {COLUMN_ID}, {COLUMN_EMBEDDING})
                 VALUES (?1, ?2, vec_f32(?3))",
                table = names.table
            ))?
            .execute(params![context, id, embedding.as_slice().as_bytes()])?;
            Ok(())
        })
        .await
    }

    async fn delete_vectors(&mut self, context: i64, id: i64) -> Result<u64, StorageError> {
        let deleted = self
            .with_conn(move |conn, names| {
                Ok(conn
                    .prepare_cached(&format!(
                        "DELETE FROM {table} WHERE {COLUMN_CONTEXT} = ?1 AND {COLUMN_ID} = ?2",
                        table = names.table
                    ))?
                    .execute(params![context, id])?)
            })
            .await?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.finish("ROLLBACK").await
    }
}
