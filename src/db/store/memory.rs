use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::filter::Filter;
use super::overlay::Overlay;
use super::DocumentStore;
use crate::db::DbError;

/// In-process document store with the same commit/rollback semantics as
/// [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    committed: Mutex<HashMap<&'static str, BTreeMap<String, JsonValue>>>,
    pending: Mutex<Overlay>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed documents in a table.
    pub fn committed_len(&self, table: &str) -> usize {
        lock(&self.committed).get(table).map_or(0, BTreeMap::len)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, table: &'static str, id: &str) -> Result<Option<JsonValue>, DbError> {
        if let Some(entry) = lock(&self.pending).lookup(table, id) {
            return Ok(entry.cloned());
        }
        Ok(lock(&self.committed)
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    async fn find(&self, table: &'static str, filter: &Filter) -> Result<Vec<JsonValue>, DbError> {
        let persisted: Vec<(String, JsonValue)> = lock(&self.committed)
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(lock(&self.pending).merge(table, filter, persisted))
    }

    async fn upsert(&self, table: &'static str, id: &str, doc: JsonValue) -> Result<(), DbError> {
        lock(&self.pending).put(table, id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, table: &'static str, id: &str) -> Result<(), DbError> {
        lock(&self.pending).remove(table, id.to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        let writes = lock(&self.pending).drain();
        let mut committed = lock(&self.committed);
        for (table, id, entry) in writes {
            let rows = committed.entry(table).or_default();
            match entry {
                Some(doc) => {
                    rows.insert(id, doc);
                }
                None => {
                    rows.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(&self) {
        lock(&self.pending).clear();
    }
}
