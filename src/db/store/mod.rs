//! Keyed entity store over JSONB documents.
//!
//! Handlers talk to [`EntityStore`], a typed facade over a [`DocumentStore`]
//! backend. Backends buffer every write of the running batch and only make
//! it durable on [`DocumentStore::commit`], so a failed batch can be
//! discarded with [`DocumentStore::rollback`] and replayed from scratch.

pub mod filter;
pub mod memory;
pub mod overlay;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::error::DbError;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A persisted entity with a natural string key.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Backing table name.
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

/// Untyped document backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, table: &'static str, id: &str) -> Result<Option<JsonValue>, DbError>;

    async fn find(&self, table: &'static str, filter: &Filter) -> Result<Vec<JsonValue>, DbError>;

    async fn upsert(&self, table: &'static str, id: &str, doc: JsonValue) -> Result<(), DbError>;

    async fn delete(&self, table: &'static str, id: &str) -> Result<(), DbError>;

    /// Make all buffered writes durable as one unit.
    async fn commit(&self) -> Result<(), DbError>;

    /// Drop all buffered writes.
    async fn rollback(&self);
}

/// Typed entry point used by handlers.
#[derive(Clone)]
pub struct EntityStore {
    backend: Arc<dyn DocumentStore>,
}

impl EntityStore {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, DbError> {
        match self.backend.get(E::TABLE, id).await? {
            Some(doc) => Ok(Some(decode::<E>(id, doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, DbError> {
        self.backend
            .find(E::TABLE, filter)
            .await?
            .into_iter()
            .map(|doc| {
                let id = doc
                    .get("id")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                decode::<E>(&id, doc)
            })
            .collect()
    }

    pub async fn count<E: Entity>(&self, filter: &Filter) -> Result<usize, DbError> {
        Ok(self.backend.find(E::TABLE, filter).await?.len())
    }

    pub async fn exists<E: Entity>(&self, id: &str) -> Result<bool, DbError> {
        Ok(self.backend.get(E::TABLE, id).await?.is_some())
    }

    pub async fn save<E: Entity>(&self, entity: &E) -> Result<(), DbError> {
        let doc = serde_json::to_value(entity).map_err(|source| DbError::Serialization {
            table: E::TABLE,
            id: entity.id().to_string(),
            source,
        })?;
        self.backend.upsert(E::TABLE, entity.id(), doc).await
    }

    pub async fn save_all<E: Entity>(&self, entities: &[E]) -> Result<(), DbError> {
        for entity in entities {
            self.save(entity).await?;
        }
        Ok(())
    }

    pub async fn remove<E: Entity>(&self, entity: &E) -> Result<(), DbError> {
        self.backend.delete(E::TABLE, entity.id()).await
    }

    pub async fn remove_all<E: Entity>(&self, entities: &[E]) -> Result<(), DbError> {
        for entity in entities {
            self.remove(entity).await?;
        }
        Ok(())
    }

    pub async fn commit(&self) -> Result<(), DbError> {
        self.backend.commit().await
    }

    pub async fn rollback(&self) {
        self.backend.rollback().await
    }
}

fn decode<E: Entity>(id: &str, doc: JsonValue) -> Result<E, DbError> {
    serde_json::from_value(doc).map_err(|source| DbError::Serialization {
        table: E::TABLE,
        id: id.to_string(),
        source,
    })
}
