//! Batch-scoped write buffer shared by the document stores.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value as JsonValue;

use super::filter::Filter;
use crate::db::DbOperation;

/// Pending writes of the running batch. `None` marks a removal.
#[derive(Debug, Default)]
pub struct Overlay {
    tables: HashMap<&'static str, BTreeMap<String, Option<JsonValue>>>,
}

impl Overlay {
    /// `Some(None)` when the document was removed in this batch, `None`
    /// when the overlay knows nothing about it.
    pub fn lookup(&self, table: &str, id: &str) -> Option<Option<&JsonValue>> {
        self.tables
            .get(table)
            .and_then(|rows| rows.get(id))
            .map(|entry| entry.as_ref())
    }

    pub fn put(&mut self, table: &'static str, id: String, doc: JsonValue) {
        self.tables.entry(table).or_default().insert(id, Some(doc));
    }

    pub fn remove(&mut self, table: &'static str, id: String) {
        self.tables.entry(table).or_default().insert(id, None);
    }

    /// Combine persisted matches with pending writes, ordered by id.
    pub fn merge(
        &self,
        table: &str,
        filter: &Filter,
        persisted: Vec<(String, JsonValue)>,
    ) -> Vec<JsonValue> {
        let mut rows: BTreeMap<String, JsonValue> = persisted.into_iter().collect();
        if let Some(pending) = self.tables.get(table) {
            for (id, entry) in pending {
                rows.remove(id);
                if let Some(doc) = entry {
                    if filter.matches(doc) {
                        rows.insert(id.clone(), doc.clone());
                    }
                }
            }
        }
        rows.into_values().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|rows| rows.is_empty())
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Drain into upsert/delete operations, tables in name order.
    pub fn drain_operations(&mut self) -> Vec<DbOperation> {
        let mut tables: Vec<_> = self.tables.drain().collect();
        tables.sort_by_key(|(table, _)| *table);

        let mut ops = Vec::new();
        for (table, rows) in tables {
            for (id, entry) in rows {
                ops.push(match entry {
                    Some(doc) => DbOperation::upsert_document(table, &id, doc),
                    None => DbOperation::delete_document(table, &id),
                });
            }
        }
        ops
    }

    /// Drain into `(table, id, doc)` triples.
    pub fn drain(&mut self) -> Vec<(&'static str, String, Option<JsonValue>)> {
        self.tables
            .drain()
            .flat_map(|(table, rows)| {
                rows.into_iter().map(move |(id, entry)| (table, id, entry))
            })
            .collect()
    }
}
