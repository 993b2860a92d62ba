//! Deferred search-index updates.
//!
//! Posts and spaces touched by a batch are queued by id and pushed at the
//! start of the next batch, after the batch that produced them committed.
//! Index failures never fail a batch.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::rpc::{IndexDocument, IndexKind, SearchIndex};
use crate::types::entities::{Post, Space};

pub struct IndexingQueue {
    index: Option<Arc<dyn SearchIndex>>,
    push_batch_size: usize,
    queue: Mutex<BTreeMap<(u8, String), IndexDocument>>,
}

fn kind_order(kind: IndexKind) -> u8 {
    match kind {
        IndexKind::Space => 0,
        IndexKind::Post => 1,
    }
}

impl IndexingQueue {
    pub fn new(index: Option<Arc<dyn SearchIndex>>, push_batch_size: usize) -> Self {
        Self {
            index,
            push_batch_size: push_batch_size.max(1),
            queue: Mutex::new(BTreeMap::new()),
        }
    }

    /// A queue that drops everything, for runs without a search backend.
    pub fn disabled() -> Self {
        Self::new(None, 1)
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, BTreeMap<(u8, String), IndexDocument>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enqueue(&self, doc: IndexDocument) {
        if self.index.is_none() {
            return;
        }
        self.queue().insert((kind_order(doc.kind), doc.id.clone()), doc);
    }

    /// Queue the latest state of a post. Re-adding replaces the entry.
    pub fn add_post(&self, post: &Post) {
        self.enqueue(IndexDocument {
            kind: IndexKind::Post,
            id: post.id.clone(),
            body: json!({
                "space_id": post.space_id,
                "title": post.title,
                "body": post.body,
                "summary": post.summary,
                "tags": post.tags,
                "hidden": post.hidden,
                "is_comment": post.is_comment,
                "owned_by_account_id": post.owned_by_account_id,
            }),
        });
    }

    pub fn add_space(&self, space: &Space) {
        self.enqueue(IndexDocument {
            kind: IndexKind::Space,
            id: space.id.clone(),
            body: json!({
                "name": space.name,
                "about": space.about,
                "username": space.username,
                "tags": space.tags,
                "hidden": space.hidden,
                "owned_by_account_id": space.owned_by_account_id,
            }),
        });
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.queue().clear();
    }

    /// Push everything queued, `push_batch_size` documents at a time. The
    /// queue is empty afterwards whatever the outcome.
    pub async fn process_indexing_queue(&self) {
        let docs: Vec<IndexDocument> = std::mem::take(&mut *self.queue()).into_values().collect();
        let Some(index) = &self.index else {
            return;
        };
        if docs.is_empty() {
            return;
        }

        let mut failed = 0usize;
        for chunk in docs.chunks(self.push_batch_size) {
            let futures = chunk.iter().map(|doc| index.push(doc));
            let results = futures::future::join_all(futures).await;
            for (doc, result) in chunk.iter().zip(results) {
                if let Err(e) = result {
                    failed += 1;
                    tracing::warn!("Failed to index {:?} {}: {}", doc.kind, doc.id, e);
                }
            }
        }

        tracing::info!("Pushed {} search documents ({} failed)", docs.len(), failed);
    }
}
