use async_trait::async_trait;

use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::synthetic::synthetic_event_name;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_post};
use crate::transformations::util::follows::{follow_post, unfollow_post};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::EventName;

/// Follows of posts, comments and replies.
pub struct PostFollowsHandler;

#[async_trait]
impl TransformationHandler for PostFollowsHandler {
    fn name(&self) -> &'static str {
        "PostFollows"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::PostFollowed, LogicalEvent::PostUnfollowed]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::PostFollow(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;

        let mut follower = ensure_account(ctx, &data.follower_id, meta).await?;
        let mut post = require_post(ctx, &data.post_id, meta.name.as_str()).await?;

        let raw = if meta.name == LogicalEvent::PostFollowed {
            follow_post(ctx, &mut follower, &mut post).await?;
            EventName::PostFollowed
        } else {
            unfollow_post(ctx, &mut follower, &mut post).await?;
            EventName::PostUnfollowed
        };
        ctx.store.save(&follower).await?;
        ctx.store.save(&post).await?;

        let params = ActivityParams {
            post_id: Some(post.id.clone()),
            space_id: post.space_id.clone(),
            ..ActivityParams::new(synthetic_event_name(raw, &post), meta, &follower.id)
        };
        emit(
            ctx,
            params,
            FanOut {
                post: Some(&post),
                follower_account_id: Some(&follower.id),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(PostFollowsHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Filter;
    use crate::decoding::events::PostFollowData;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Account, Activity, CommentFollowers, Notification, Post};

    fn follow(name: LogicalEvent, post_id: &str, block: u64) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            name,
            EventData::PostFollow(PostFollowData {
                follower_id: "5A".into(),
                post_id: post_id.into(),
            }),
        )
    }

    async fn seed_post(harness: &TestHarness, id: &str, root: Option<&str>) {
        harness
            .store
            .save(&Post {
                id: id.into(),
                owned_by_account_id: "5Author".into(),
                root_post_id: root.map(String::from),
                is_comment: root.is_some(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_comment_follow_uses_comment_names() {
        let harness = TestHarness::new();
        seed_post(&harness, "10", None).await;
        seed_post(&harness, "11", Some("10")).await;
        let ctx = harness.ctx();

        PostFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::PostFollowed, "11", 1))
            .await
            .unwrap();

        assert!(harness
            .store
            .exists::<CommentFollowers>(&CommentFollowers::id_for("5A", "11"))
            .await
            .unwrap());
        let activity = harness.store.find::<Activity>(&Filter::All).await.unwrap();
        assert_eq!(activity[0].event, EventName::CommentFollowed);
        assert_eq!(activity[0].agg_count, 1);
        assert_eq!(
            harness
                .store
                .count::<Notification>(&Filter::eq("account_id", "5Author"))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_unfollow_restores_counters() {
        let harness = TestHarness::new();
        seed_post(&harness, "10", None).await;
        let ctx = harness.ctx();

        PostFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::PostFollowed, "10", 1))
            .await
            .unwrap();
        PostFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::PostUnfollowed, "10", 2))
            .await
            .unwrap();

        let post = harness.store.get::<Post>("10").await.unwrap().unwrap();
        assert_eq!(post.followers_count, 0);
        let account = harness.store.get::<Account>("5A").await.unwrap().unwrap();
        assert_eq!(account.following_posts_count, 0);
    }
}
