//! In-memory fixtures for transformation tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};

use super::activity::ActivityParams;
use super::content::ContentResolver;
use super::context::TransformationContext;
use super::indexing::IndexingQueue;
use super::prefetch::StoragePrefetch;
use crate::db::store::MemoryStore;
use crate::db::EntityStore;
use crate::decoding::storage::domain_key;
use crate::decoding::{Chain, EventData, EventMetadata, LogicalEvent, ParsedEvent, StorageSection};
use crate::raw_data::Block;
use crate::rpc::{ChainStorage, ContentError, ContentSource, IndexDocument, RpcError, SearchIndex};
use crate::types::config::ChainVariant;
use crate::types::entities::Activity;
use crate::types::EventName;

pub const BLOCK_MS: i64 = 6_000;

pub fn block_time(height: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(height as i64 * BLOCK_MS).unwrap_or_default()
}

/// Archive block at `height` with runtime spec 30.
pub fn block(height: u64, events: JsonValue, calls: JsonValue) -> Block {
    serde_json::from_value(json!({
        "header": {
            "height": height,
            "hash": format!("0x{:04x}", height),
            "timestamp": height as i64 * BLOCK_MS,
            "specVersion": 30
        },
        "events": events,
        "calls": calls
    }))
    .unwrap()
}

pub fn metadata(name: LogicalEvent, block_number: u64, index_in_block: u32) -> EventMetadata {
    EventMetadata {
        name,
        block_number,
        block_hash: format!("0x{:04x}", block_number),
        timestamp: block_time(block_number),
        index_in_block,
        spec_version: 30,
    }
}

pub fn parsed(
    id: &str,
    block_number: u64,
    index_in_block: u32,
    name: LogicalEvent,
    data: EventData,
) -> ParsedEvent {
    ParsedEvent {
        id: id.to_string(),
        metadata: metadata(name, block_number, index_in_block),
        data,
    }
}

/// Activity row at block 7 as the ledger would write it.
pub fn activity(event: EventName, account: &str, edit: impl FnOnce(&mut ActivityParams)) -> Activity {
    let meta = metadata(LogicalEvent::PostCreated, 7, 0);
    let mut params = ActivityParams::new(event, &meta, account);
    edit(&mut params);
    params.into_activity(0)
}

#[derive(Default)]
pub struct StaticStorage {
    values: Mutex<HashMap<(String, String), JsonValue>>,
    calls: AtomicUsize,
}

impl StaticStorage {
    pub fn insert(&self, block_hash: &str, domain: &str, value: JsonValue) {
        self.values
            .lock()
            .unwrap()
            .insert((block_hash.to_string(), domain_key(domain).to_string()), value);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainStorage for StaticStorage {
    async fn read_many(
        &self,
        _section: StorageSection,
        block_hash: &str,
        keys: &[JsonValue],
    ) -> Result<Vec<Option<JsonValue>>, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let values = self.values.lock().unwrap();
        Ok(keys
            .iter()
            .map(|key| values.get(&(block_hash.to_string(), key.to_string())).cloned())
            .collect())
    }
}

#[derive(Default)]
pub struct StaticContent {
    docs: Mutex<HashMap<String, JsonValue>>,
    calls: AtomicUsize,
}

impl StaticContent {
    pub fn insert(&self, cid: &str, doc: JsonValue) {
        self.docs.lock().unwrap().insert(cid.to_string(), doc);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    async fn fetch(&self, cid: &str) -> Result<JsonValue, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.docs.lock().unwrap().get(cid).cloned().ok_or_else(|| {
            ContentError::Fetch(RpcError::Status {
                status: 404,
                body: cid.to_string(),
            })
        })
    }
}

/// Content source that answers only after `delay`.
pub struct SlowContent {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowContent {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for SlowContent {
    async fn fetch(&self, _cid: &str) -> Result<JsonValue, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(json!({}))
    }
}

#[derive(Default)]
pub struct RecordingIndex {
    pushed: Mutex<Vec<IndexDocument>>,
    fail: bool,
}

impl RecordingIndex {
    pub fn failing() -> Self {
        Self {
            pushed: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn pushed(&self) -> Vec<IndexDocument> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn push(&self, doc: &IndexDocument) -> Result<(), RpcError> {
        if self.fail {
            return Err(RpcError::Transport("connection refused".into()));
        }
        self.pushed.lock().unwrap().push(doc.clone());
        Ok(())
    }
}

/// Services wired to in-memory backends.
pub struct TestHarness {
    pub chain: Chain,
    pub store: EntityStore,
    pub memory: Arc<MemoryStore>,
    pub storage_reader: Arc<StaticStorage>,
    pub ipfs: Arc<StaticContent>,
    pub index: Arc<RecordingIndex>,
    pub storage: StoragePrefetch,
    pub content: ContentResolver,
    pub indexing: IndexingQueue,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_chain(ChainVariant::Subsocial)
    }

    pub fn with_chain(variant: ChainVariant) -> Self {
        let memory = Arc::new(MemoryStore::new());
        let storage_reader = Arc::new(StaticStorage::default());
        let ipfs = Arc::new(StaticContent::default());
        let index = Arc::new(RecordingIndex::default());
        Self {
            chain: Chain::new(variant),
            store: EntityStore::new(memory.clone()),
            memory,
            storage: StoragePrefetch::new(storage_reader.clone()),
            content: ContentResolver::new(ipfs.clone(), Duration::from_secs(1), 4),
            indexing: IndexingQueue::new(Some(index.clone()), 10),
            storage_reader,
            ipfs,
            index,
        }
    }

    pub fn ctx(&self) -> TransformationContext<'_> {
        TransformationContext {
            chain: &self.chain,
            store: &self.store,
            storage: &self.storage,
            content: &self.content,
            indexing: &self.indexing,
        }
    }
}
