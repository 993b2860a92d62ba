//! Batched chain storage reads for the running batch.
//!
//! Storage keys referenced by the batch are grouped by block hash and read
//! with one call per group before any handler runs. Handlers then look values
//! up from the cache; a missing entry is a normal outcome, not an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;

use super::error::TransformationError;
use super::scope::EventScope;
use crate::decoding::storage::domain_key;
use crate::decoding::{Chain, DomainMeta, EventData, LogicalEvent, StorageSection};
use crate::rpc::ChainStorage;

type CacheKey = (StorageSection, String, String);

pub struct StoragePrefetch {
    reader: Arc<dyn ChainStorage>,
    cache: Mutex<HashMap<CacheKey, JsonValue>>,
}

impl StoragePrefetch {
    pub fn new(reader: Arc<dyn ChainStorage>) -> Self {
        Self {
            reader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, JsonValue>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read every storage value the batch's events will ask for.
    pub async fn fetch_by_events_data(
        &self,
        chain: &Chain,
        scope: &EventScope,
    ) -> Result<(), TransformationError> {
        if chain.domains().is_none() {
            return Ok(());
        }

        let mut by_block: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for name in [LogicalEvent::DomainRegistered, LogicalEvent::DomainMetaUpdated] {
            for event in scope.section(name).values() {
                let domain = match &event.data {
                    EventData::DomainRegistered(data) => &data.domain,
                    EventData::DomainMetaUpdated(data) => &data.domain,
                    _ => continue,
                };
                by_block
                    .entry(event.metadata.block_hash.as_str())
                    .or_default()
                    .insert(domain.clone());
            }
        }

        for (block_hash, domains) in by_block {
            let domains: Vec<String> = domains.into_iter().collect();
            let keys: Vec<JsonValue> = domains.iter().map(|d| domain_key(d)).collect();
            let values = self
                .reader
                .read_many(StorageSection::RegisteredDomains, block_hash, &keys)
                .await?;

            let mut cache = self.cache();
            for (domain, value) in domains.into_iter().zip(values) {
                if let Some(value) = value {
                    cache.insert(
                        (StorageSection::RegisteredDomains, block_hash.to_string(), domain),
                        value,
                    );
                }
            }
            tracing::debug!(
                "Prefetched {} domain records at block {}",
                keys.len(),
                block_hash
            );
        }

        Ok(())
    }

    /// Cached raw value. `None` when the key was never fetched or is empty
    /// on chain.
    pub fn get_storage_data_by_id(
        &self,
        section: StorageSection,
        block_hash: &str,
        id: &str,
    ) -> Option<JsonValue> {
        self.cache()
            .get(&(section, block_hash.to_string(), id.to_string()))
            .cloned()
    }

    /// Decoded domain record at `block_hash`. Undecodable records are
    /// logged and treated as absent.
    pub fn domain_meta(&self, chain: &Chain, block_hash: &str, domain: &str) -> Option<DomainMeta> {
        let api = chain.domains()?;
        let raw = self.get_storage_data_by_id(StorageSection::RegisteredDomains, block_hash, domain)?;
        match api.decode_domain_meta(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Undecodable domain record for {}: {}", domain, e);
                None
            }
        }
    }

    pub fn purge(&self) {
        self.cache().clear();
    }
}
