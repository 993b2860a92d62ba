use async_trait::async_trait;

use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::ensure_account;
use crate::transformations::util::follows::{follow_account, unfollow_account};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::EventName;

pub struct AccountFollowsHandler;

#[async_trait]
impl TransformationHandler for AccountFollowsHandler {
    fn name(&self) -> &'static str {
        "AccountFollows"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::AccountFollowed, LogicalEvent::AccountUnfollowed]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::AccountFollow(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;

        let mut follower = ensure_account(ctx, &data.follower_id, meta).await?;
        let mut following = ensure_account(ctx, &data.account_id, meta).await?;

        let name = if meta.name == LogicalEvent::AccountFollowed {
            follow_account(ctx, &mut follower, &mut following).await?;
            EventName::AccountFollowed
        } else {
            unfollow_account(ctx, &mut follower, &mut following).await?;
            EventName::AccountUnfollowed
        };
        ctx.store.save(&follower).await?;
        ctx.store.save(&following).await?;

        let params = ActivityParams {
            following_account_id: Some(following.id.clone()),
            ..ActivityParams::new(name, meta, &follower.id)
        };
        emit(
            ctx,
            params,
            FanOut {
                following_account_id: Some(&following.id),
                follower_account_id: Some(&follower.id),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(AccountFollowsHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Filter;
    use crate::decoding::events::AccountFollowData;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Account, AccountFollowers, Activity, Notification};

    fn follow(name: LogicalEvent, follower: &str, block: u64) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            name,
            EventData::AccountFollow(AccountFollowData {
                follower_id: follower.into(),
                account_id: "5B".into(),
            }),
        )
    }

    #[tokio::test]
    async fn test_follow_counts_and_notifies() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();

        AccountFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::AccountFollowed, "5A", 1))
            .await
            .unwrap();
        AccountFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::AccountFollowed, "5C", 2))
            .await
            .unwrap();

        let followed = harness.store.get::<Account>("5B").await.unwrap().unwrap();
        assert_eq!(followed.followers_count, 2);
        let activities = harness
            .store
            .find::<Activity>(&Filter::eq("aggregated", true))
            .await
            .unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].agg_count, 2);
        let notified = harness
            .store
            .count::<Notification>(&Filter::eq("account_id", "5B"))
            .await
            .unwrap();
        assert_eq!(notified, 2);
    }

    #[tokio::test]
    async fn test_unfollow_without_follow_keeps_counts() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();
        AccountFollowsHandler
            .handle(&ctx, &follow(LogicalEvent::AccountUnfollowed, "5A", 1))
            .await
            .unwrap();
        let followed = harness.store.get::<Account>("5B").await.unwrap().unwrap();
        assert_eq!(followed.followers_count, 0);
        assert!(!harness
            .store
            .exists::<AccountFollowers>(&AccountFollowers::id_for("5A", "5B"))
            .await
            .unwrap());
    }
}
