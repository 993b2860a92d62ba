use async_trait::async_trait;

use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_space};
use crate::transformations::util::follows::{follow_space, unfollow_space};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::EventName;

pub struct SpaceFollowsHandler;

#[async_trait]
impl TransformationHandler for SpaceFollowsHandler {
    fn name(&self) -> &'static str {
        "SpaceFollows"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::SpaceFollowed, LogicalEvent::SpaceUnfollowed]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::SpaceFollow(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;

        let mut follower = ensure_account(ctx, &data.follower_id, meta).await?;
        let mut space = require_space(ctx, &data.space_id, meta.name.as_str()).await?;

        let name = if meta.name == LogicalEvent::SpaceFollowed {
            follow_space(ctx, &mut follower, &mut space).await?;
            EventName::SpaceFollowed
        } else {
            unfollow_space(ctx, &mut follower, &mut space).await?;
            EventName::SpaceUnfollowed
        };
        ctx.store.save(&follower).await?;
        ctx.store.save(&space).await?;

        let params = ActivityParams {
            space_id: Some(space.id.clone()),
            ..ActivityParams::new(name, meta, &follower.id)
        };
        emit(
            ctx,
            params,
            FanOut {
                space: Some(&space),
                follower_account_id: Some(&follower.id),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(SpaceFollowsHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Filter;
    use crate::decoding::events::SpaceFollowData;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Notification, Space};

    fn follow(name: LogicalEvent, block: u64) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            name,
            EventData::SpaceFollow(SpaceFollowData {
                follower_id: "5A".into(),
                space_id: "1".into(),
            }),
        )
    }

    #[tokio::test]
    async fn test_follow_notifies_owner_and_unfollow_reverts() {
        let harness = TestHarness::new();
        harness
            .store
            .save(&Space {
                id: "1".into(),
                owned_by_account_id: "5Owner".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let ctx = harness.ctx();

        SpaceFollowsHandler.handle(&ctx, &follow(LogicalEvent::SpaceFollowed, 1)).await.unwrap();
        assert_eq!(
            harness.store.get::<Space>("1").await.unwrap().unwrap().followers_count,
            1
        );
        assert_eq!(
            harness
                .store
                .count::<Notification>(&Filter::eq("account_id", "5Owner"))
                .await
                .unwrap(),
            1
        );

        SpaceFollowsHandler.handle(&ctx, &follow(LogicalEvent::SpaceUnfollowed, 2)).await.unwrap();
        assert_eq!(
            harness.store.get::<Space>("1").await.unwrap().unwrap().followers_count,
            0
        );
    }

    #[tokio::test]
    async fn test_follow_of_unknown_space_fails() {
        let harness = TestHarness::new();
        let result = SpaceFollowsHandler
            .handle(&harness.ctx(), &follow(LogicalEvent::SpaceFollowed, 1))
            .await;
        assert!(matches!(result, Err(TransformationError::EntityMissing { .. })));
    }
}
