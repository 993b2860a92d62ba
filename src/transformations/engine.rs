//! Transformation engine that orchestrates handler execution.
//!
//! The engine receives batches of archive blocks, decodes them into an
//! [`EventScope`], prefetches chain storage and off-chain content, then runs
//! the registered handlers in registration order. Every write of a batch is
//! buffered in the entity store and committed together with the batch's
//! `SquidStatus` checkpoint; a failed batch is rolled back and retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::Receiver;

use super::content::ContentResolver;
use super::context::TransformationContext;
use super::error::TransformationError;
use super::indexing::IndexingQueue;
use super::prefetch::StoragePrefetch;
use super::registry::TransformationRegistry;
use super::scope::EventScope;
use crate::db::EntityStore;
use crate::decoding::Chain;
use crate::raw_data::Block;
use crate::types::entities::SquidStatus;

/// Outcome of one committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub first_block: u64,
    pub last_block: u64,
    /// Decoded events in scope.
    pub events: usize,
    /// Handler invocations, one per (handler, event).
    pub handled: usize,
}

pub struct TransformationEngine {
    registry: Arc<TransformationRegistry>,
    store: EntityStore,
    chain: Chain,
    storage: StoragePrefetch,
    content: ContentResolver,
    indexing: IndexingQueue,
    chain_name: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl TransformationEngine {
    pub fn new(
        registry: Arc<TransformationRegistry>,
        store: EntityStore,
        chain: Chain,
        storage: StoragePrefetch,
        content: ContentResolver,
        indexing: IndexingQueue,
        chain_name: String,
    ) -> Self {
        Self {
            registry,
            store,
            chain,
            storage,
            content,
            indexing,
            chain_name,
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Retry a failed batch up to `max_retries` times, waiting
    /// `retry_delay * attempt` between attempts.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Last committed block of this chain.
    pub async fn checkpoint(&self) -> Result<Option<SquidStatus>, TransformationError> {
        Ok(self.store.get::<SquidStatus>(&self.chain_name).await?)
    }

    /// Apply one batch. On error nothing of the batch is persisted.
    pub async fn process_batch(&self, blocks: &[Block]) -> Result<BatchSummary, TransformationError> {
        // Documents queued by the previous, committed batch.
        self.indexing.process_indexing_queue().await;

        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            return Ok(BatchSummary::default());
        };

        match self.apply(blocks, first.header.height, last).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.store.rollback().await;
                self.indexing.clear();
                self.storage.purge();
                self.content.purge();
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        blocks: &[Block],
        first_block: u64,
        last: &Block,
    ) -> Result<BatchSummary, TransformationError> {
        let scope = EventScope::build(&self.chain, blocks)?;
        self.storage.fetch_by_events_data(&self.chain, &scope).await?;
        self.content.prefetch(&scope).await;

        let ctx = TransformationContext {
            chain: &self.chain,
            store: &self.store,
            storage: &self.storage,
            content: &self.content,
            indexing: &self.indexing,
        };

        let mut handled = 0;
        for handler in self.registry.all_handlers() {
            let events = scope.sorted(handler.triggers());
            if events.is_empty() {
                continue;
            }
            tracing::debug!(
                "Invoking handler {} for {} events in blocks {}-{}",
                handler.name(),
                events.len(),
                first_block,
                last.header.height
            );
            for event in events {
                handler.handle(&ctx, event).await.inspect_err(|e| {
                    tracing::error!(
                        "Handler {} failed on event {} at block {}: {}",
                        handler.name(),
                        event.id,
                        event.metadata.block_number,
                        e
                    );
                })?;
                handled += 1;
            }
        }

        self.storage.purge();
        self.content.purge();

        self.store
            .save(&SquidStatus {
                id: self.chain_name.clone(),
                height: last.header.height,
                hash: last.header.hash.clone(),
            })
            .await?;
        self.store.commit().await?;

        Ok(BatchSummary {
            first_block,
            last_block: last.header.height,
            events: scope.len(),
            handled,
        })
    }

    /// Process batches from the block source until it closes.
    pub async fn run(&self, mut blocks_rx: Receiver<Vec<Block>>) -> Result<(), TransformationError> {
        tracing::info!(
            "Transformation engine started for chain {} with {} handlers",
            self.chain_name,
            self.registry.handler_count()
        );

        while let Some(blocks) = blocks_rx.recv().await {
            let mut attempt = 0;
            loop {
                let started = Instant::now();
                match self.process_batch(&blocks).await {
                    Ok(summary) => {
                        tracing::info!(
                            "Committed blocks {}-{}: {} events, {} handler calls in {:?}",
                            summary.first_block,
                            summary.last_block,
                            summary.events,
                            summary.handled,
                            started.elapsed()
                        );
                        break;
                    }
                    Err(e) if attempt < self.max_retries => {
                        attempt += 1;
                        tracing::warn!(
                            "Batch failed (attempt {}/{}): {}. Retrying",
                            attempt,
                            self.max_retries + 1,
                            e
                        );
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                    Err(e) => {
                        tracing::error!("Batch failed after {} attempts: {}", attempt + 1, e);
                        return Err(e);
                    }
                }
            }
        }

        self.indexing.process_indexing_queue().await;
        tracing::info!(
            "Block stream closed, transformation engine shutting down for chain {}",
            self.chain_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value as JsonValue};
    use tokio::sync::mpsc;

    use super::*;
    use crate::db::store::MemoryStore;
    use crate::db::Filter;
    use crate::transformations::build_registry;
    use crate::transformations::testing::{block, RecordingIndex, StaticContent, StaticStorage};
    use crate::types::config::ChainVariant;
    use crate::types::entities::{
        Account, AccountFollowers, Activity, Notification, Post, Reaction, Space,
    };
    use crate::types::EventName;

    struct Fixture {
        engine: TransformationEngine,
        store: EntityStore,
        memory: Arc<MemoryStore>,
        storage: Arc<StaticStorage>,
        index: Arc<RecordingIndex>,
    }

    fn fixture() -> Fixture {
        let memory = Arc::new(MemoryStore::new());
        let store = EntityStore::new(memory.clone());
        let storage = Arc::new(StaticStorage::default());
        let index = Arc::new(RecordingIndex::default());
        let engine = TransformationEngine::new(
            Arc::new(build_registry()),
            store.clone(),
            Chain::new(ChainVariant::Subsocial),
            StoragePrefetch::new(storage.clone()),
            ContentResolver::new(Arc::new(StaticContent::default()), Duration::from_secs(1), 4),
            IndexingQueue::new(Some(index.clone()), 10),
            "subsocial".to_string(),
        );
        Fixture {
            engine,
            store,
            memory,
            storage,
            index,
        }
    }

    fn event(height: u64, index: u32, name: &str, args: JsonValue, call: Option<&str>) -> JsonValue {
        json!({
            "id": format!("{}-{}", height, index),
            "indexInBlock": index,
            "name": name,
            "args": args,
            "callId": call,
        })
    }

    fn space_created(height: u64, owner: &str, space_id: &str) -> Block {
        let call_id = format!("{}-c0", height);
        block(
            height,
            json!([event(
                height,
                0,
                "Spaces.SpaceCreated",
                json!({"account": owner, "spaceId": space_id}),
                Some(&call_id)
            )]),
            json!([{"id": call_id, "name": "Spaces.create_space", "args": {"content": {"__kind": "None"}}}]),
        )
    }

    fn post_created(height: u64, author: &str, post_id: &str, space_id: &str) -> Block {
        let call_id = format!("{}-c0", height);
        block(
            height,
            json!([event(
                height,
                0,
                "Posts.PostCreated",
                json!({"account": author, "postId": post_id}),
                Some(&call_id)
            )]),
            json!([{
                "id": call_id,
                "name": "Posts.create_post",
                "args": {
                    "spaceIdOpt": space_id,
                    "extension": {"__kind": "RegularPost"},
                    "content": {"__kind": "None"}
                }
            }]),
        )
    }

    fn follows(height: u64, names: &[&str], follower: &str, account: &str) -> Block {
        let events: Vec<JsonValue> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                event(height, i as u32, name, json!({"follower": follower, "account": account}), None)
            })
            .collect();
        block(height, JsonValue::Array(events), json!([]))
    }

    fn reaction(height: u64, account: &str, reaction_id: &str) -> Block {
        block(
            height,
            json!([event(
                height,
                0,
                "Reactions.PostReactionCreated",
                json!({
                    "account": account,
                    "postId": "100",
                    "reactionId": reaction_id,
                    "reactionKind": {"__kind": "Upvote"}
                }),
                None
            )]),
            json!([]),
        )
    }

    #[tokio::test]
    async fn test_post_in_foreign_space_notifies_space_owner() {
        let f = fixture();
        let summary = f
            .engine
            .process_batch(&[space_created(1, "5Owner", "10"), post_created(2, "5Abc", "100", "10")])
            .await
            .unwrap();
        assert_eq!((summary.first_block, summary.last_block), (1, 2));
        assert_eq!(summary.handled, 2);

        let post = f.store.get::<Post>("100").await.unwrap().unwrap();
        assert_eq!(post.owned_by_account_id, "5Abc");
        assert!(!post.is_comment);
        assert_eq!(post.space_id.as_deref(), Some("10"));

        let created = f
            .store
            .find::<Activity>(&Filter::eq("event", "PostCreated"))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert!(created[0].aggregated);
        assert_eq!(created[0].agg_count, 0);

        let notifications = f
            .store
            .find::<Notification>(&Filter::eq("event", "PostCreated"))
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].account_id, "5Owner");

        let status = f.engine.checkpoint().await.unwrap().unwrap();
        assert_eq!((status.height, status.hash.as_str()), (2, "0x0002"));
        assert_eq!(f.memory.committed_len("post"), 1);
    }

    #[tokio::test]
    async fn test_follow_then_unfollow_in_one_batch_leaves_no_trace() {
        let f = fixture();
        f.engine
            .process_batch(&[follows(
                1,
                &["AccountFollows.AccountFollowed", "AccountFollows.AccountUnfollowed"],
                "5A",
                "5B",
            )])
            .await
            .unwrap();

        assert_eq!(f.store.count::<AccountFollowers>(&Filter::All).await.unwrap(), 0);
        let a = f.store.get::<Account>("5A").await.unwrap().unwrap();
        let b = f.store.get::<Account>("5B").await.unwrap().unwrap();
        assert_eq!(a.following_accounts_count, 0);
        assert_eq!(b.followers_count, 0);

        let followed = f
            .store
            .find::<Activity>(&Filter::eq("event", EventName::AccountFollowed.as_str()))
            .await
            .unwrap();
        assert_eq!(followed.len(), 1);
        assert_eq!(followed[0].agg_count, 1);
        assert!(followed[0].aggregated);

        let for_b = f
            .store
            .find::<Notification>(&Filter::eq("account_id", "5B"))
            .await
            .unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].event, EventName::AccountFollowed);
        assert_eq!(for_b[0].activity_id, followed[0].id);
        assert_eq!(
            f.store
                .count::<Notification>(&Filter::eq("account_id", "5A"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_mixed_case_domain_is_prefetched_and_transferred() {
        let f = fixture();
        f.storage.insert(
            "0x0001",
            "alice.sub",
            json!({"owner": "5Old", "innerValue": null, "outerValue": null, "content": {"__kind": "None"}}),
        );
        let name = format!("0x{}", hex::encode("Alice.SUB"));
        let registered = block(
            1,
            json!([event(1, 0, "Domains.DomainRegistered", json!({"who": "5Old", "domain": name}), None)]),
            json!([]),
        );
        let accepted = block(
            2,
            json!([event(
                2,
                0,
                "Ownership.OwnershipTransferAccepted",
                json!({"account": "5New", "entity": {"__kind": "Domain", "value": name}}),
                None
            )]),
            json!([]),
        );
        f.engine.process_batch(&[registered, accepted]).await.unwrap();

        assert_eq!(f.storage.calls(), 1);
        let old = f.store.get::<Account>("5Old").await.unwrap().unwrap();
        let new = f.store.get::<Account>("5New").await.unwrap().unwrap();
        assert!(old.usernames.is_empty());
        assert_eq!(new.usernames, vec!["alice.sub".to_string()]);
    }

    #[tokio::test]
    async fn test_reactions_in_one_batch_aggregate_in_block_order() {
        let f = fixture();
        f.store
            .save(&Post {
                id: "100".into(),
                owned_by_account_id: "5Author".into(),
                space_id: Some("10".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        f.store.commit().await.unwrap();

        f.engine
            .process_batch(&[reaction(4, "5B", "2"), reaction(3, "5A", "1")])
            .await
            .unwrap();

        assert_eq!(f.store.count::<Reaction>(&Filter::All).await.unwrap(), 2);
        let post = f.store.get::<Post>("100").await.unwrap().unwrap();
        assert_eq!(post.reactions_count, 2);

        let rows = f
            .store
            .find::<Activity>(&Filter::eq("event", EventName::PostReactionCreated.as_str()))
            .await
            .unwrap();
        let first = rows.iter().find(|a| a.block_number == 3).unwrap();
        let second = rows.iter().find(|a| a.block_number == 4).unwrap();
        assert_eq!((first.agg_count, first.aggregated), (1, false));
        assert_eq!((second.agg_count, second.aggregated), (2, true));
    }

    #[tokio::test]
    async fn test_replayed_batch_reproduces_same_state() {
        let f = fixture();
        let batch = [follows(1, &["AccountFollows.AccountFollowed"], "5A", "5B")];
        f.engine.process_batch(&batch).await.unwrap();
        f.engine.process_batch(&batch).await.unwrap();

        let b = f.store.get::<Account>("5B").await.unwrap().unwrap();
        assert_eq!(b.followers_count, 1);
        assert_eq!(f.store.count::<Notification>(&Filter::All).await.unwrap(), 1);
        let activity = f.store.find::<Activity>(&Filter::All).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].agg_count, 1);
        assert!(activity[0].aggregated);
    }

    #[tokio::test]
    async fn test_failed_batch_is_rolled_back() {
        let f = fixture();
        let result = f
            .engine
            .process_batch(&[
                follows(1, &["AccountFollows.AccountFollowed"], "5A", "5B"),
                post_created(2, "5Abc", "100", "404"),
            ])
            .await;
        assert!(matches!(result, Err(TransformationError::EntityMissing { .. })));

        assert!(f.engine.checkpoint().await.unwrap().is_none());
        assert_eq!(f.store.count::<Account>(&Filter::All).await.unwrap(), 0);
        assert_eq!(f.memory.committed_len("account"), 0);
    }

    #[tokio::test]
    async fn test_index_pushed_after_commit_on_next_batch() {
        let f = fixture();
        f.engine
            .process_batch(&[space_created(1, "5Owner", "10")])
            .await
            .unwrap();
        assert!(f.index.pushed().is_empty());

        f.engine.process_batch(&[]).await.unwrap();
        let pushed = f.index.pushed();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].id, "10");
        assert!(f.store.get::<Space>("10").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_stops_on_persistent_failure() {
        let f = fixture();
        let engine = f.engine.with_retries(1, Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(2);
        tx.send(vec![post_created(1, "5Abc", "100", "404")]).await.unwrap();
        drop(tx);

        let result = engine.run(rx).await;
        assert!(matches!(result, Err(TransformationError::EntityMissing { .. })));
    }

    #[tokio::test]
    async fn test_run_drains_stream() {
        let f = fixture();
        let (tx, rx) = mpsc::channel(2);
        tx.send(vec![space_created(1, "5Owner", "10")]).await.unwrap();
        tx.send(vec![follows(2, &["AccountFollows.AccountFollowed"], "5A", "5Owner")])
            .await
            .unwrap();
        drop(tx);

        f.engine.run(rx).await.unwrap();
        let status = f.engine.checkpoint().await.unwrap().unwrap();
        assert_eq!(status.height, 2);
        assert_eq!(f.index.pushed().len(), 1);
    }
}
