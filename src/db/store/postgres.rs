use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::filter::Filter;
use super::overlay::Overlay;
use super::DocumentStore;
use crate::db::{DbError, DbPool, DbValue};

/// PostgreSQL document store. Reads merge committed rows with the batch's
/// pending writes; `commit` flushes them in one transaction.
pub struct PgStore {
    pool: Arc<DbPool>,
    pending: Mutex<Overlay>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            pool,
            pending: Mutex::new(Overlay::default()),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Overlay> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, table: &'static str, id: &str) -> Result<Option<JsonValue>, DbError> {
        let buffered = self.pending().lookup(table, id).map(|entry| entry.cloned());
        if let Some(entry) = buffered {
            return Ok(entry);
        }

        let rows = self
            .pool
            .query_documents(table, "id = $1", &[DbValue::Text(id.to_string())])
            .await?;
        Ok(rows.into_iter().next().map(|(_, doc)| doc))
    }

    async fn find(&self, table: &'static str, filter: &Filter) -> Result<Vec<JsonValue>, DbError> {
        let mut params = Vec::new();
        let condition = filter.to_sql(&mut params);
        let persisted = self.pool.query_documents(table, &condition, &params).await?;
        Ok(self.pending().merge(table, filter, persisted))
    }

    async fn upsert(&self, table: &'static str, id: &str, doc: JsonValue) -> Result<(), DbError> {
        self.pending().put(table, id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, table: &'static str, id: &str) -> Result<(), DbError> {
        self.pending().remove(table, id.to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        let ops = self.pending().drain_operations();
        if ops.is_empty() {
            return Ok(());
        }
        tracing::debug!("Flushing {} document operations", ops.len());
        self.pool.execute_transaction(ops).await
    }

    async fn rollback(&self) {
        self.pending().clear();
    }
}
