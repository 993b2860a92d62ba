use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::decoding::events::{PostCreatedData, PostMovedData, PostUpdatedData};
use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::content::{ContentSection, PostContent};
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::synthetic::synthetic_event_name;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_post, require_space};
use crate::transformations::util::follows::follow_post;
use crate::transformations::util::{decrement, increment};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{
    ContentExtension, ExtensionPinnedResource, ExtensionSchemaId, Post, PostKind, Space,
};
use crate::types::EventName;

pub struct PostsHandler;

fn apply_content(post: &mut Post, content: PostContent) {
    post.summary = content.summary();
    post.title = content.title;
    post.body = content.body;
    post.image = content.image;
    post.link = content.link;
    post.format = content.format;
    post.canonical = content.canonical;
    post.tags = content.tags;
}

fn clear_content(post: &mut Post) {
    apply_content(post, PostContent::default());
    post.content = None;
}

/// Count one more post in a bucket, split by visibility.
fn add_visible(total: &mut u32, public: &mut u32, hidden: &mut u32, is_hidden: bool) {
    increment(total);
    increment(if is_hidden { hidden } else { public });
}

fn remove_visible(total: &mut u32, public: &mut u32, hidden: &mut u32, is_hidden: bool) {
    decrement(total);
    decrement(if is_hidden { hidden } else { public });
}

/// Move one post between the public and hidden buckets.
fn flip_visible(public: &mut u32, hidden: &mut u32, now_hidden: bool) {
    if now_hidden {
        decrement(public);
        increment(hidden);
    } else {
        decrement(hidden);
        increment(public);
    }
}

fn add_to_space(space: &mut Space, is_hidden: bool) {
    add_visible(
        &mut space.posts_count,
        &mut space.public_posts_count,
        &mut space.hidden_posts_count,
        is_hidden,
    );
}

fn remove_from_space(space: &mut Space, is_hidden: bool) {
    remove_visible(
        &mut space.posts_count,
        &mut space.public_posts_count,
        &mut space.hidden_posts_count,
        is_hidden,
    );
}

fn add_reply(post: &mut Post, is_hidden: bool) {
    add_visible(
        &mut post.replies_count,
        &mut post.public_replies_count,
        &mut post.hidden_replies_count,
        is_hidden,
    );
}

/// Ids listed by a pinned-posts extension.
fn pinned_ids(properties: &JsonValue) -> Vec<String> {
    properties
        .get("ids")
        .and_then(JsonValue::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| match id {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

impl PostsHandler {
    async fn created(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &PostCreatedData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        ensure_account(ctx, &data.account_id, meta).await?;
        let owner_id = data.owner_id.as_deref().unwrap_or(&data.account_id);
        let mut owner = ensure_account(ctx, owner_id, meta).await?;

        let mut post = Post {
            id: data.post_id.clone(),
            kind: data.kind,
            is_comment: data.kind == PostKind::Comment,
            hidden: data.hidden,
            created_by_account_id: data.account_id.clone(),
            owned_by_account_id: owner.id.clone(),
            space_id: data.space_id.clone(),
            root_post_id: data.root_post_id.clone(),
            parent_post_id: data.parent_post_id.clone(),
            shared_post_id: data.shared_post_id.clone(),
            created_at_block: meta.block_number,
            created_at_time: Some(meta.timestamp),
            content: data.content_cid.clone(),
            ..Default::default()
        };

        let mut extensions = Vec::new();
        if let Some(cid) = &data.content_cid {
            if let Some(content) = ctx.content::<PostContent>(ContentSection::Post, cid, meta).await? {
                extensions = content.extensions.clone();
                apply_content(&mut post, content);
            }
        }

        match (&post.root_post_id, post.kind) {
            (Some(root_id), PostKind::Comment) => {
                let mut root = require_post(ctx, root_id, "CommentCreated").await?;
                if post.space_id.is_none() {
                    post.space_id = root.space_id.clone();
                }
                add_reply(&mut root, post.hidden);
                ctx.store.save(&root).await?;

                if let Some(parent_id) = post.parent_post_id.as_deref().filter(|p| *p != root.id) {
                    let mut parent = require_post(ctx, parent_id, "CommentReplyCreated").await?;
                    add_reply(&mut parent, post.hidden);
                    ctx.store.save(&parent).await?;
                }
            }
            _ => {
                match &post.space_id {
                    Some(space_id) => {
                        let mut space = require_space(ctx, space_id, "PostCreated").await?;
                        add_to_space(&mut space, post.hidden);
                        ctx.store.save(&space).await?;
                    }
                    None => tracing::warn!("Post {} created outside any space", post.id),
                }
                if let Some(shared_id) = &post.shared_post_id {
                    let mut original = require_post(ctx, shared_id, "SharedPost").await?;
                    increment(&mut original.shares_count);
                    ctx.store.save(&original).await?;
                }
            }
        }

        increment(&mut owner.owned_posts_count);
        follow_post(ctx, &mut owner, &mut post).await?;
        ctx.store.save(&owner).await?;
        ctx.store.save(&post).await?;
        ctx.indexing.add_post(&post);

        let params = ActivityParams {
            post_id: Some(post.id.clone()),
            space_id: post.space_id.clone(),
            ..ActivityParams::new(
                synthetic_event_name(EventName::PostCreated, &post),
                meta,
                &data.account_id,
            )
        };
        emit(
            ctx,
            params,
            FanOut {
                post: Some(&post),
                ..Default::default()
            },
        )
        .await?;

        self.extensions(ctx, event, &post, &extensions).await
    }

    /// Persist content extensions and record one activity per extension.
    async fn extensions(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        post: &Post,
        raw: &[JsonValue],
    ) -> Result<(), TransformationError> {
        for (index, item) in raw.iter().enumerate() {
            let schema = item
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value::<ExtensionSchemaId>(id).ok());
            let Some(schema) = schema else {
                tracing::debug!("Skipping unsupported extension {} of post {}", index, post.id);
                continue;
            };
            let properties = item.get("properties").cloned().unwrap_or(JsonValue::Null);

            let recipient = match schema {
                ExtensionSchemaId::Donations => {
                    let target = post.parent_post_id.as_deref().or(post.root_post_id.as_deref());
                    match target {
                        Some(id) => ctx.store.get::<Post>(id).await?.map(|p| p.owned_by_account_id),
                        None => None,
                    }
                }
                ExtensionSchemaId::SecretBox => properties
                    .get("recipient")
                    .and_then(JsonValue::as_str)
                    .map(String::from),
                _ => None,
            };

            let extension = ContentExtension {
                id: format!("{}-{}", post.id, index),
                post_id: post.id.clone(),
                created_by_account_id: post.created_by_account_id.clone(),
                schema_id: schema,
                recipient_account_id: recipient,
                properties,
            };
            ctx.store.save(&extension).await?;

            if schema == ExtensionSchemaId::PinnedPosts {
                for pinned in pinned_ids(&extension.properties) {
                    ctx.store
                        .save(&ExtensionPinnedResource {
                            id: format!("{}-{}", extension.id, pinned),
                            content_extension_id: extension.id.clone(),
                            resource_post_id: Some(pinned),
                            resource_space_id: None,
                        })
                        .await?;
                }
            }

            let params = ActivityParams {
                post_id: Some(post.id.clone()),
                space_id: post.space_id.clone(),
                extension_id: Some(extension.id.clone()),
                extension_index: Some(index),
                ..ActivityParams::new(schema.event_name(), &event.metadata, &post.created_by_account_id)
            };
            emit(
                ctx,
                params,
                FanOut {
                    post: Some(post),
                    recipient_id: extension.recipient_account_id.as_deref(),
                    ..Default::default()
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn updated(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &PostUpdatedData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let mut post = require_post(ctx, &data.post_id, "PostUpdated").await?;

        match &data.content_cid {
            Some(Some(cid)) => {
                post.content = Some(cid.clone());
                if let Some(content) = ctx.content::<PostContent>(ContentSection::Post, cid, meta).await? {
                    apply_content(&mut post, content);
                }
            }
            Some(None) => clear_content(&mut post),
            None => {}
        }

        if let Some(hidden) = data.hidden.filter(|h| *h != post.hidden) {
            if let Some(root_id) = &post.root_post_id {
                let mut root = require_post(ctx, root_id, "PostUpdated").await?;
                flip_visible(&mut root.public_replies_count, &mut root.hidden_replies_count, hidden);
                ctx.store.save(&root).await?;
                if let Some(parent_id) = post.parent_post_id.as_deref().filter(|p| p != root_id) {
                    let mut parent = require_post(ctx, parent_id, "PostUpdated").await?;
                    flip_visible(&mut parent.public_replies_count, &mut parent.hidden_replies_count, hidden);
                    ctx.store.save(&parent).await?;
                }
            } else if let Some(space_id) = &post.space_id {
                let mut space = require_space(ctx, space_id, "PostUpdated").await?;
                flip_visible(&mut space.public_posts_count, &mut space.hidden_posts_count, hidden);
                ctx.store.save(&space).await?;
            }
            post.hidden = hidden;
        }

        post.updated_at_time = Some(meta.timestamp);
        ctx.store.save(&post).await?;
        ctx.indexing.add_post(&post);

        let params = ActivityParams {
            post_id: Some(post.id.clone()),
            space_id: post.space_id.clone(),
            ..ActivityParams::new(
                synthetic_event_name(EventName::PostUpdated, &post),
                meta,
                &data.account_id,
            )
        };
        emit(
            ctx,
            params,
            FanOut {
                post: Some(&post),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }

    async fn moved(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &PostMovedData,
    ) -> Result<(), TransformationError> {
        let meta = &event.metadata;
        let mut post = require_post(ctx, &data.post_id, "PostMoved").await?;
        let from = post.space_id.clone().or_else(|| data.from_space.clone());
        let to = data.to_space.clone();

        if let Some(from_id) = &from {
            match ctx.store.get::<Space>(from_id).await? {
                Some(mut space) => {
                    remove_from_space(&mut space, post.hidden);
                    ctx.store.save(&space).await?;
                }
                None => tracing::warn!("Post {} moved from unknown space {}", post.id, from_id),
            }
        }
        let target = match &to {
            Some(to_id) => {
                let mut space = require_space(ctx, to_id, "PostMoved").await?;
                add_to_space(&mut space, post.hidden);
                ctx.store.save(&space).await?;
                Some(space)
            }
            None => None,
        };

        // Restoring a post from outside any space.
        if from.is_none() && to.is_some() {
            let mut owner = ensure_account(ctx, &post.owned_by_account_id, meta).await?;
            if follow_post(ctx, &mut owner, &mut post).await? {
                ctx.store.save(&owner).await?;
            }
        }

        post.space_id = to.clone();
        post.updated_at_time = Some(meta.timestamp);
        ctx.store.save(&post).await?;
        ctx.indexing.add_post(&post);

        let params = ActivityParams {
            post_id: Some(post.id.clone()),
            space_id: to,
            space_prev_id: from.clone(),
            ..ActivityParams::new(
                synthetic_event_name(EventName::PostMoved, &post),
                meta,
                &data.account_id,
            )
        };
        emit(
            ctx,
            params,
            FanOut {
                post: Some(&post),
                space: target.as_ref(),
                previous_space_id: from.as_deref(),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TransformationHandler for PostsHandler {
    fn name(&self) -> &'static str {
        "Posts"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[
            LogicalEvent::PostCreated,
            LogicalEvent::PostUpdated,
            LogicalEvent::PostMoved,
        ]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        match &event.data {
            EventData::PostCreated(data) => self.created(ctx, event, data).await,
            EventData::PostUpdated(data) => self.updated(ctx, event, data).await,
            EventData::PostMoved(data) => self.moved(ctx, event, data).await,
            _ => Err(TransformationError::unexpected(self.name(), event)),
        }
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(PostsHandler);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::Filter;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Account, Activity, Notification, PostFollowers};

    async fn seed_space(harness: &TestHarness, id: &str, owner: &str) {
        harness
            .store
            .save(&Space {
                id: id.into(),
                owned_by_account_id: owner.into(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        post_id: &str,
        account: &str,
        block: u64,
        kind: PostKind,
        space: Option<&str>,
        root: Option<&str>,
        parent: Option<&str>,
        cid: Option<&str>,
    ) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            LogicalEvent::PostCreated,
            EventData::PostCreated(PostCreatedData {
                account_id: account.into(),
                post_id: post_id.into(),
                space_id: space.map(String::from),
                kind,
                root_post_id: root.map(String::from),
                parent_post_id: parent.map(String::from),
                shared_post_id: None,
                content_cid: cid.map(String::from),
                forced: false,
                owner_id: None,
                hidden: false,
            }),
        )
    }

    fn regular(post_id: &str, account: &str, block: u64) -> ParsedEvent {
        create(post_id, account, block, PostKind::RegularPost, Some("1"), None, None, None)
    }

    #[tokio::test]
    async fn test_regular_post_counts_follows_and_notifies_space_owner() {
        let harness = TestHarness::new();
        seed_space(&harness, "1", "5Owner").await;
        let ctx = harness.ctx();

        PostsHandler.handle(&ctx, &regular("10", "5A", 1)).await.unwrap();

        let space = harness.store.get::<Space>("1").await.unwrap().unwrap();
        assert_eq!((space.posts_count, space.public_posts_count), (1, 1));
        let author = harness.store.get::<Account>("5A").await.unwrap().unwrap();
        assert_eq!(author.owned_posts_count, 1);
        assert_eq!(author.following_posts_count, 1);
        assert!(harness
            .store
            .exists::<PostFollowers>(&PostFollowers::id_for("5A", "10"))
            .await
            .unwrap());

        let activity = harness.store.find::<Activity>(&Filter::All).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].event, EventName::PostCreated);
        assert!(activity[0].aggregated);
        assert_eq!(activity[0].agg_count, 0);

        let notifications = harness.store.find::<Notification>(&Filter::All).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].account_id, "5Owner");
    }

    #[tokio::test]
    async fn test_comment_and_reply_topology() {
        let harness = TestHarness::new();
        seed_space(&harness, "1", "5Owner").await;
        let ctx = harness.ctx();

        PostsHandler.handle(&ctx, &regular("10", "5A", 1)).await.unwrap();
        PostsHandler
            .handle(
                &ctx,
                &create("11", "5B", 2, PostKind::Comment, None, Some("10"), None, None),
            )
            .await
            .unwrap();
        PostsHandler
            .handle(
                &ctx,
                &create("12", "5C", 3, PostKind::Comment, None, Some("10"), Some("11"), None),
            )
            .await
            .unwrap();

        let root = harness.store.get::<Post>("10").await.unwrap().unwrap();
        assert_eq!(root.replies_count, 2);
        let comment = harness.store.get::<Post>("11").await.unwrap().unwrap();
        assert_eq!(comment.replies_count, 1);
        assert_eq!(comment.space_id.as_deref(), Some("1"));
        assert!(comment.is_comment);
        assert_eq!(comment.root_post_id.as_deref(), Some("10"));
        assert_eq!(comment.parent_post_id, None);
        let reply = harness.store.get::<Post>("12").await.unwrap().unwrap();
        assert!(reply.is_comment);
        assert_eq!(reply.root_post_id.as_deref(), Some("10"));
        assert_eq!(reply.parent_post_id.as_deref(), Some("11"));

        let events: Vec<EventName> = harness
            .store
            .find::<Activity>(&Filter::All)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.event)
            .collect();
        assert!(events.contains(&EventName::CommentCreated));
        assert!(events.contains(&EventName::CommentReplyCreated));

        let space = harness.store.get::<Space>("1").await.unwrap().unwrap();
        assert_eq!(space.posts_count, 1);

        let notified_on_reply = harness
            .store
            .find::<Notification>(&Filter::eq("event", "CommentReplyCreated"))
            .await
            .unwrap();
        let mut accounts: Vec<_> = notified_on_reply.iter().map(|n| n.account_id.as_str()).collect();
        accounts.sort();
        assert_eq!(accounts, vec!["5A", "5B"]);
    }

    #[tokio::test]
    async fn test_comment_on_unknown_root_fails() {
        let harness = TestHarness::new();
        let result = PostsHandler
            .handle(
                &harness.ctx(),
                &create("11", "5B", 2, PostKind::Comment, None, Some("404"), None, None),
            )
            .await;
        assert!(matches!(result, Err(TransformationError::EntityMissing { .. })));
    }

    #[tokio::test]
    async fn test_hide_then_move_out_keeps_counters_non_negative() {
        let harness = TestHarness::new();
        seed_space(&harness, "1", "5Owner").await;
        let ctx = harness.ctx();
        PostsHandler.handle(&ctx, &regular("10", "5A", 1)).await.unwrap();

        let hide = parsed(
            "2-0",
            2,
            0,
            LogicalEvent::PostUpdated,
            EventData::PostUpdated(PostUpdatedData {
                account_id: "5A".into(),
                post_id: "10".into(),
                content_cid: None,
                hidden: Some(true),
            }),
        );
        PostsHandler.handle(&ctx, &hide).await.unwrap();
        let space = harness.store.get::<Space>("1").await.unwrap().unwrap();
        assert_eq!((space.public_posts_count, space.hidden_posts_count), (0, 1));

        let out = parsed(
            "3-0",
            3,
            0,
            LogicalEvent::PostMoved,
            EventData::PostMoved(PostMovedData {
                account_id: "5A".into(),
                post_id: "10".into(),
                from_space: Some("1".into()),
                to_space: None,
            }),
        );
        PostsHandler.handle(&ctx, &out).await.unwrap();
        let space = harness.store.get::<Space>("1").await.unwrap().unwrap();
        assert_eq!(
            (space.posts_count, space.public_posts_count, space.hidden_posts_count),
            (0, 0, 0)
        );
        let deleted = harness
            .store
            .count::<Activity>(&Filter::eq("event", "PostDeleted"))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_extensions_are_stored_with_indexed_activity_ids() {
        let harness = TestHarness::new();
        seed_space(&harness, "1", "5Owner").await;
        harness.ipfs.insert(
            "cid-p",
            json!({
                "body": "pinned",
                "extensions": [
                    {"id": "subsocial-pinned-posts", "properties": {"ids": ["7", 8]}},
                    {"id": "unknown-ext", "properties": {}},
                    {"id": "subsocial-image", "properties": {"image": "cid-img"}}
                ]
            }),
        );
        let ctx = harness.ctx();
        PostsHandler
            .handle(
                &ctx,
                &create("10", "5A", 1, PostKind::RegularPost, Some("1"), None, None, Some("cid-p")),
            )
            .await
            .unwrap();

        assert!(harness.store.exists::<ContentExtension>("10-0").await.unwrap());
        assert!(!harness.store.exists::<ContentExtension>("10-1").await.unwrap());
        assert!(harness.store.exists::<ContentExtension>("10-2").await.unwrap());
        assert!(harness
            .store
            .exists::<ExtensionPinnedResource>("10-0-8")
            .await
            .unwrap());

        let image = harness
            .store
            .find::<Activity>(&Filter::eq("event", "ExtensionImageCreated"))
            .await
            .unwrap();
        assert_eq!(image.len(), 1);
        assert!(image[0].id.ends_with("-2"));
    }
}
