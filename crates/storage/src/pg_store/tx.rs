use std::sync::Arc;

use async_trait::async_trait;
use ledger_vectordb_core::{Embedding, VectorDbConfig};
use sqlx::{Postgres, Transaction};

use crate::error::StorageError;
use crate::schema::{COLUMN_CONTEXT, COLUMN_EMBEDDING, COLUMN_ID, TableNames};
use crate::traits::{VectorTx, check_dimensions};

/// Block transaction on PostgreSQL. sqlx rolls back on drop.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    names: Arc<TableNames>,
    config: VectorDbConfig,
}

impl std::fmt::Debug for PgTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTx").field("table", &self.names.table).finish_non_exhaustive()
    }
}

impl PgTx {
    pub(super) fn new(
        tx: Transaction<'static, Postgres>,
        names: Arc<TableNames>,
        config: VectorDbConfig,
    ) -> Self {
        Self { tx, names, config }
    }

    /// Hand the transaction back to the host without committing.
    #[must_use]
    pub fn into_inner(self) -> Transaction<'static, Postgres> {
        self.tx
    }
}

#[async_trait]
impl VectorTx for PgTx {
    async fn insert_vector(
        &mut self,
        context: i64,
        id: i64,
        embedding: &Embedding,
    ) -> Result<(), StorageError> {
        check_dimensions(&self.config, embedding)?;
        sqlx::query(&format!(
            "INSERT INTO {table} ({COLUMN_CONTEXT}, {COLUMN_ID}, {COLUMN_EMBEDDING})
             VALUES ($1, $2, $3::{ty})",
            table = self.names.table,
            ty = self.config.precision.pg_type(),
        ))
        .bind(context)
        .bind(id)
        .bind(embedding.to_literal())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_vectors(&mut self, context: i64, id: i64) -> Result<u64, StorageError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE {COLUMN_CONTEXT} = $1 AND {COLUMN_ID} = $2",
            table = self.names.table
        ))
        .bind(context)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
