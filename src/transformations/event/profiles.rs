use async_trait::async_trait;

use crate::decoding::{EventData, LogicalEvent, ParsedEvent};
use crate::transformations::activity::ActivityParams;
use crate::transformations::fanout::FanOut;
use crate::transformations::registry::TransformationRegistry;
use crate::transformations::traits::TransformationHandler;
use crate::transformations::util::effects::emit;
use crate::transformations::util::entities::{ensure_account, require_space};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::EventName;

/// Points an account's profile at one of its spaces, or resets it.
pub struct ProfilesHandler;

#[async_trait]
impl TransformationHandler for ProfilesHandler {
    fn name(&self) -> &'static str {
        "Profiles"
    }

    fn triggers(&self) -> &'static [LogicalEvent] {
        &[LogicalEvent::ProfileUpdated]
    }

    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError> {
        let EventData::ProfileUpdated(data) = &event.data else {
            return Err(TransformationError::unexpected(self.name(), event));
        };
        let meta = &event.metadata;

        let mut account = ensure_account(ctx, &data.account_id, meta).await?;
        let space = match &data.space_id {
            Some(space_id) => Some(require_space(ctx, space_id, "ProfileUpdated").await?),
            None => None,
        };
        account.profile_space_id = space.as_ref().map(|s| s.id.clone());
        account.updated_at_time = Some(meta.timestamp);
        ctx.store.save(&account).await?;

        let params = ActivityParams {
            space_id: account.profile_space_id.clone(),
            ..ActivityParams::new(EventName::ProfileUpdated, meta, &account.id)
        };
        emit(
            ctx,
            params,
            FanOut {
                space: space.as_ref(),
                ..Default::default()
            },
        )
        .await?;
        Ok(())
    }
}

pub fn register_handlers(registry: &mut TransformationRegistry) {
    registry.register_handler(ProfilesHandler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::events::ProfileUpdatedData;
    use crate::transformations::testing::{parsed, TestHarness};
    use crate::types::entities::{Account, AccountFollowers, Notification, Space};

    fn profile(space: Option<&str>, block: u64) -> ParsedEvent {
        parsed(
            &format!("{}-0", block),
            block,
            0,
            LogicalEvent::ProfileUpdated,
            EventData::ProfileUpdated(ProfileUpdatedData {
                account_id: "5A".into(),
                space_id: space.map(String::from),
            }),
        )
    }

    #[tokio::test]
    async fn test_set_and_reset_profile() {
        let harness = TestHarness::new();
        harness
            .store
            .save(&Space {
                id: "1".into(),
                owned_by_account_id: "5A".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        harness.store.save(&AccountFollowers::new("5F", "5A")).await.unwrap();
        let ctx = harness.ctx();

        ProfilesHandler.handle(&ctx, &profile(Some("1"), 1)).await.unwrap();
        let account = harness.store.get::<Account>("5A").await.unwrap().unwrap();
        assert_eq!(account.profile_space_id.as_deref(), Some("1"));
        let notified = harness
            .store
            .count::<Notification>(&crate::db::Filter::eq("account_id", "5F"))
            .await
            .unwrap();
        assert_eq!(notified, 1);

        ProfilesHandler.handle(&ctx, &profile(None, 2)).await.unwrap();
        let account = harness.store.get::<Account>("5A").await.unwrap().unwrap();
        assert!(account.profile_space_id.is_none());
    }
}
