//! IPFS content resolution for spaces and posts.
//!
//! All CIDs referenced by a batch are fetched concurrently up front. Handlers
//! then read the decoded bodies from the cache. A failed or timed-out fetch
//! is remembered for the batch so handlers never wait on it twice.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use super::scope::EventScope;
use super::util::summary::summarize;
use crate::decoding::{EventData, LogicalEvent};
use crate::rpc::{ContentError, ContentSource};

/// Which kind of document a CID is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSection {
    Space,
    Post,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpaceContent {
    pub name: Option<String>,
    pub about: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub links: Vec<String>,
}

impl SpaceContent {
    pub fn summary(&self) -> Option<String> {
        self.about.as_deref().map(summarize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostContent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub format: Option<String>,
    pub canonical: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    /// Raw extension records, `{"id": <schema>, "properties": {..}}`.
    pub extensions: Vec<JsonValue>,
}

impl PostContent {
    /// Explicit summary, otherwise one derived from the body.
    pub fn summary(&self) -> Option<String> {
        self.summary
            .clone()
            .or_else(|| self.body.as_deref().map(summarize))
    }
}

/// Keep the string entries of an array; anything else reads as empty.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                JsonValue::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

type CachedContent = Result<JsonValue, String>;

pub struct ContentResolver {
    source: Arc<dyn ContentSource>,
    timeout: Duration,
    concurrency: usize,
    cache: Mutex<HashMap<String, CachedContent>>,
}

impl ContentResolver {
    pub fn new(source: Arc<dyn ContentSource>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            source,
            timeout,
            concurrency: concurrency.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedContent>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn fetch_one(&self, cid: String) -> (String, CachedContent) {
        let result = match tokio::time::timeout(self.timeout, self.source.fetch(&cid)).await {
            Ok(Ok(doc)) => Ok(doc),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(ContentError::Timeout(self.timeout).to_string()),
        };
        (cid, result)
    }

    /// Fetch every CID referenced by the scope's space and post events.
    pub async fn prefetch(&self, scope: &EventScope) {
        let mut cids = BTreeSet::new();
        for name in [
            LogicalEvent::SpaceCreated,
            LogicalEvent::SpaceUpdated,
            LogicalEvent::PostCreated,
            LogicalEvent::PostUpdated,
        ] {
            for event in scope.section(name).values() {
                let cid = match &event.data {
                    EventData::SpaceCreated(d) => d.content_cid.as_ref(),
                    EventData::SpaceUpdated(d) => d.content_cid.as_ref().and_then(Option::as_ref),
                    EventData::PostCreated(d) => d.content_cid.as_ref(),
                    EventData::PostUpdated(d) => d.content_cid.as_ref().and_then(Option::as_ref),
                    _ => None,
                };
                if let Some(cid) = cid {
                    cids.insert(cid.clone());
                }
            }
        }

        let pending: Vec<String> = {
            let cache = self.cache();
            cids.into_iter().filter(|cid| !cache.contains_key(cid)).collect()
        };
        if pending.is_empty() {
            return;
        }

        let total = pending.len();
        let results: Vec<(String, CachedContent)> = stream::iter(pending)
            .map(|cid| self.fetch_one(cid))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        self.cache().extend(results);
        tracing::info!("Prefetched {} IPFS documents ({} failed)", total, failed);
    }

    /// Decoded content for `cid`, fetching on a cache miss.
    pub async fn fetch_content_by_cid<T: DeserializeOwned>(
        &self,
        section: ContentSection,
        cid: &str,
    ) -> Result<T, ContentError> {
        let cached = self.cache().get(cid).cloned();
        let raw = match cached {
            Some(entry) => entry,
            None => {
                let (cid, entry) = self.fetch_one(cid.to_string()).await;
                self.cache().insert(cid, entry.clone());
                entry
            }
        };

        let doc = raw.map_err(ContentError::Unavailable)?;
        serde_json::from_value(doc)
            .map_err(|e| ContentError::Parse(format!("{:?} content {}: {}", section, cid, e)))
    }

    pub fn purge(&self) {
        self.cache().clear();
    }
}
