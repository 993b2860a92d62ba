use async_trait::async_trait;

use crate::decoding::events::ReactionData;
use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::synthetic::synthetic_event_name;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_post};
use crate::transformations::util::{decrement, increment};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{Post, Reaction, ReactionKind, ReactionStatus};
use crate::types::EventName;

pub struct ReactionsHandler;

fn kind_counter(post: &mut Post, kind: ReactionKind) -> &mut u32 {
    match kind {
        ReactionKind::Upvote => &mut post.upvotes_count,
        ReactionKind::Downvote => &mut post.downvotes_count,
    }
}

fn flipped(kind: ReactionKind) -> ReactionKind {
    match kind {
        ReactionKind::Upvote => ReactionKind::Downvote,
        ReactionKind::Downvote => ReactionKind::Upvote,
    }
}

impl ReactionsHandler {
    async fn created(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &ReactionData,
        post: &mut Post,
    ) -> Result<Option<Reaction>, TransformationError> {
        let meta = &event.metadata;
        let kind = data.kind.unwrap_or_else(|| {
            tracing::warn!(
                "Reaction {} at block {} has no kind, assuming Upvote",
                data.reaction_id,
                meta.block_number
            );
            ReactionKind::Upvote
        });

        if let Some(existing) = ctx.store.get::<Reaction>(&data.reaction_id).await? {
            if existing.status == ReactionStatus::Active {
                tracing::warn!("Reaction {} already exists", data.reaction_id);
                return Ok(None);
            }
        }

        increment(&mut post.reactions_count);
        increment(kind_counter(post, kind));
        Ok(Some(Reaction {
            id: data.reaction_id.clone(),
            post_id: post.id.clone(),
            account_id: data.account_id.clone(),
            kind,
            status: ReactionStatus::Active,
            created_at_block: meta.block_number,
            created_at_time: Some(meta.timestamp),
            updated_at_time: None,
        }))
    }

    async fn updated(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &ReactionData,
        post: &mut Post,
    ) -> Result<Option<Reaction>, TransformationError> {
        let mut reaction = ctx
            .require::<Reaction>("Reaction", &data.reaction_id, "PostReactionUpdated")
            .await?;
        let kind = data.kind.unwrap_or_else(|| flipped(reaction.kind));
        if kind != reaction.kind && reaction.status == ReactionStatus::Active {
            decrement(kind_counter(post, reaction.kind));
            increment(kind_counter(post, kind));
        }
        reaction.kind = kind;
        reaction.updated_at_time = Some(event.metadata.timestamp);
        Ok(Some(reaction))
    }

    async fn deleted(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
        data: &ReactionData,
        post: &mut Post,
    ) -> Result<Option<Reaction>, TransformationError> {
        let mut reaction = ctx
            .require::<Reaction>("Reaction", &data.reaction_id, "PostReactionDeleted")
            .await?;
        if reaction.status == ReactionStatus::Deleted {
            tracing::warn!("Reaction {} already deleted", reaction.id);
            return Ok(None);
        }
        decrement(&mut post.reactions_count);
        decrement(kind_counter(post, reaction.kind));
        reaction.status = ReactionStatus::Deleted;
        reaction.updated_at_time = Some(event.metadata.timestamp);
        Ok(Some(reaction))
    }
}

#[async_trait]
impl TransformationHandler for ReactionsHandler {
    fn name(&self) -> &'static str {
        "Reactions"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[
            LogicalEvent::PostReactionCreated,
            LogicalEvent::PostReactionUpdated,
            LogicalEvent::PostReactionDeleted,
        ]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::Reaction(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;

        ensure_account(ctx, &data.account_id, meta).await?;
        let mut post = require_post(ctx, &data.post_id, meta.name.as_str()).await?;

        let (raw, reaction) = match meta.name {
            LogicalEvent::PostReactionCreated => (
                EventName::PostReactionCreated,
                self.created(ctx, event, data, &mut post).await?,
            ),
            LogicalEvent::PostReactionUpdated => (
                EventName::PostReactionUpdated,
                self.updated(ctx, event, data, &mut post).await?,
            ),
            LogicalEvent::PostReactionDeleted => (
                EventName::PostReactionDeleted,
                self.deleted(ctx, event, data, &mut post).await?,
            ),
            _ => return Err(TransformationError::unexpected(self.name(), event)),
        };
        let Some(reaction) = reaction else {
            return Ok(());
        };

        ctx.store.save(&reaction).await?;
        ctx.store.save(&post).await?;

        let params = ActivityParams {
            post_id: Some(post.id.clone()),
            space_id: post.space_id.clone(),
            reaction_id: Some(reaction.id.clone()),
            ..ActivityParams::new(synthetic_event_name(raw, &post), meta, &data.account_id)
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
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(ReactionsHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Filter;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Activity, Notification};

    fn reaction(
        name: LogicalEvent,
        account: &str,
        reaction_id: &str,
        kind: Option<ReactionKind>,
        block: u64,
    ) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            name,
            EventData::Reaction(ReactionData {
                account_id: account.into(),
                post_id: "10".into(),
                reaction_id: reaction_id.into(),
                kind,
            }),
        )
    }

    async fn harness_with_post() -> TestHarness {
        let harness = TestHarness::new();
        harness
            .store
            .save(&Post {
                id: "10".into(),
                owned_by_account_id: "5Author".into(),
                space_id: Some("1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        harness
    }

    #[tokio::test]
    async fn test_reactions_aggregate_per_post() {
        let harness = harness_with_post().await;
        let ctx = harness.ctx();

        ReactionsHandler
            .handle(
                &ctx,
                &reaction(LogicalEvent::PostReactionCreated, "5A", "1", Some(ReactionKind::Upvote), 1),
            )
            .await
            .unwrap();
        ReactionsHandler
            .handle(
                &ctx,
                &reaction(LogicalEvent::PostReactionCreated, "5B", "2", Some(ReactionKind::Downvote), 2),
            )
            .await
            .unwrap();

        let post = harness.store.get::<Post>("10").await.unwrap().unwrap();
        assert_eq!(
            (post.reactions_count, post.upvotes_count, post.downvotes_count),
            (2, 1, 1)
        );

        let rows = harness.store.find::<Activity>(&Filter::All).await.unwrap();
        let (old, new): (Vec<_>, Vec<_>) = rows.into_iter().partition(|a| a.block_number == 1);
        assert!(!old[0].aggregated);
        assert_eq!(old[0].agg_count, 1);
        assert!(new[0].aggregated);
        assert_eq!(new[0].agg_count, 2);
    }

    #[tokio::test]
    async fn test_update_flips_kind_when_unspecified() {
        let harness = harness_with_post().await;
        let ctx = harness.ctx();
        ReactionsHandler
            .handle(
                &ctx,
                &reaction(LogicalEvent::PostReactionCreated, "5A", "1", Some(ReactionKind::Upvote), 1),
            )
            .await
            .unwrap();
        ReactionsHandler
            .handle(&ctx, &reaction(LogicalEvent::PostReactionUpdated, "5A", "1", None, 2))
            .await
            .unwrap();

        let stored = harness.store.get::<Reaction>("1").await.unwrap().unwrap();
        assert_eq!(stored.kind, ReactionKind::Downvote);
        let post = harness.store.get::<Post>("10").await.unwrap().unwrap();
        assert_eq!((post.upvotes_count, post.downvotes_count), (0, 1));
    }

    #[tokio::test]
    async fn test_delete_removes_notification_and_is_not_repeated() {
        let harness = harness_with_post().await;
        let ctx = harness.ctx();
        ReactionsHandler
            .handle(
                &ctx,
                &reaction(LogicalEvent::PostReactionCreated, "5A", "1", Some(ReactionKind::Upvote), 1),
            )
            .await
            .unwrap();
        assert_eq!(
            harness.store.count::<Notification>(&Filter::All).await.unwrap(),
            1
        );

        for block in [2, 3] {
            ReactionsHandler
                .handle(&ctx, &reaction(LogicalEvent::PostReactionDeleted, "5A", "1", None, block))
                .await
                .unwrap();
        }

        let post = harness.store.get::<Post>("10").await.unwrap().unwrap();
        assert_eq!((post.reactions_count, post.upvotes_count), (0, 0));
        assert_eq!(
            harness.store.count::<Notification>(&Filter::All).await.unwrap(),
            0
        );
        assert_eq!(
            harness
                .store
                .count::<Activity>(&Filter::eq("event", "PostReactionDeleted"))
                .await
                .unwrap(),
            1
        );
    }
}
