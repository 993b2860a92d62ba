//! Activity ledger.
//!
//! Every processed event becomes one `Activity`. Activities of the same
//! event name about the same subject form a group; exactly the newest row of
//! a group carries `aggregated = true`, and for counting events `agg_count`
//! records how many rows the group held before it.

use super::context::TransformationContext;
use super::error::TransformationError;
use crate::db::Filter;
use crate::decoding::EventMetadata;
use crate::types::entities::activity::activity_id;
use crate::types::entities::Activity;
use crate::types::EventName;

/// Field an event's activities are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Post,
    Space,
    FollowingAccount,
    Account,
}

impl GroupKey {
    pub fn field(&self) -> &'static str {
        match self {
            GroupKey::Post => "post_id",
            GroupKey::Space => "space_id",
            GroupKey::FollowingAccount => "following_account_id",
            GroupKey::Account => "account_id",
        }
    }
}

pub fn group_key(event: EventName) -> GroupKey {
    use EventName::*;

    match event {
        PostCreated | PostUpdated | PostMoved | PostDeleted | PostFollowed | PostUnfollowed
        | PostReactionCreated | PostReactionUpdated | PostReactionDeleted | CommentCreated
        | CommentUpdated | CommentDeleted | CommentFollowed | CommentUnfollowed
        | CommentReactionCreated | CommentReactionUpdated | CommentReactionDeleted
        | CommentReplyCreated | CommentReplyUpdated | CommentReplyDeleted
        | CommentReplyReactionCreated | CommentReplyReactionUpdated
        | CommentReplyReactionDeleted | PostOwnershipTransferCreated
        | PostOwnershipTransferAccepted | PostOwnershipTransferRejected
        | ExtensionDonationCreated | ExtensionEvmNftShared | ExtensionImageCreated
        | ExtensionSecretBoxCreated | ExtensionPinnedResourcesCreated => GroupKey::Post,
        SpaceCreated | SpaceUpdated | SpaceFollowed | SpaceUnfollowed
        | SpaceOwnershipTransferCreated | SpaceOwnershipTransferAccepted
        | SpaceOwnershipTransferRejected => GroupKey::Space,
        AccountFollowed | AccountUnfollowed => GroupKey::FollowingAccount,
        ProfileUpdated | DomainRegistered | DomainMetaUpdated | DomainOwnershipTransferCreated
        | DomainOwnershipTransferAccepted | DomainOwnershipTransferRejected
        | EvmAddressLinkedToAccount | EvmAddressUnlinkedFromAccount => GroupKey::Account,
    }
}

/// Events whose groups keep a running count.
pub fn is_counting(event: EventName) -> bool {
    use EventName::*;

    matches!(
        event,
        PostReactionCreated
            | PostReactionUpdated
            | CommentReactionCreated
            | CommentReactionUpdated
            | CommentReplyReactionCreated
            | CommentReplyReactionUpdated
            | PostFollowed
            | CommentFollowed
            | SpaceFollowed
            | AccountFollowed
    )
}

/// Inputs for one activity row.
#[derive(Debug, Clone)]
pub struct ActivityParams {
    pub event: EventName,
    pub block_number: u64,
    pub index_in_block: u32,
    pub date: chrono::DateTime<chrono::Utc>,
    pub account_id: String,
    pub space_id: Option<String>,
    pub space_prev_id: Option<String>,
    pub post_id: Option<String>,
    pub reaction_id: Option<String>,
    pub following_account_id: Option<String>,
    pub old_owner_id: Option<String>,
    pub new_owner_id: Option<String>,
    pub extension_id: Option<String>,
    pub extension_index: Option<usize>,
    pub username: Option<String>,
}

impl ActivityParams {
    pub fn new(event: EventName, metadata: &EventMetadata, account_id: &str) -> Self {
        Self {
            event,
            block_number: metadata.block_number,
            index_in_block: metadata.index_in_block,
            date: metadata.timestamp,
            account_id: account_id.to_string(),
            space_id: None,
            space_prev_id: None,
            post_id: None,
            reaction_id: None,
            following_account_id: None,
            old_owner_id: None,
            new_owner_id: None,
            extension_id: None,
            extension_index: None,
            username: None,
        }
    }

    pub fn activity_id(&self) -> String {
        activity_id(
            self.block_number,
            self.index_in_block,
            self.event.as_str(),
            self.extension_index,
        )
    }

    /// The row as it is written: newest of its group.
    pub fn into_activity(self, agg_count: u64) -> Activity {
        Activity {
            id: self.activity_id(),
            account_id: self.account_id,
            block_number: self.block_number,
            event_index: self.index_in_block,
            event: self.event,
            space_id: self.space_id,
            space_prev_id: self.space_prev_id,
            post_id: self.post_id,
            reaction_id: self.reaction_id,
            following_account_id: self.following_account_id,
            old_owner_id: self.old_owner_id,
            new_owner_id: self.new_owner_id,
            extension_id: self.extension_id,
            username: self.username,
            date: self.date,
            aggregated: true,
            agg_count,
        }
    }

    fn group_value(&self) -> Option<&str> {
        match group_key(self.event) {
            GroupKey::Post => self.post_id.as_deref(),
            GroupKey::Space => self.space_id.as_deref(),
            GroupKey::FollowingAccount => self.following_account_id.as_deref(),
            GroupKey::Account => Some(self.account_id.as_str()),
        }
    }
}

/// Record an activity and update its group's aggregation state. Returns
/// `None` without writing when the grouping field is missing.
pub async fn set_activity(
    ctx: &TransformationContext<'_>,
    params: ActivityParams,
) -> Result<Option<Activity>, TransformationError> {
    let key = group_key(params.event);
    let Some(group_value) = params.group_value().map(str::to_string) else {
        tracing::warn!(
            "Skipping {} activity at block {}: no {}",
            params.event,
            params.block_number,
            key.field()
        );
        return Ok(None);
    };

    let group = Filter::eq("event", params.event.as_str())
        .and(Filter::eq(key.field(), group_value))
        .and(Filter::eq("id", params.activity_id()).not());

    let previous = ctx
        .store
        .find::<Activity>(&group.clone().and(Filter::eq("aggregated", true)))
        .await?;
    for mut activity in previous {
        activity.aggregated = false;
        ctx.store.save(&activity).await?;
    }

    let agg_count = if is_counting(params.event) {
        1 + ctx.store.count::<Activity>(&group).await? as u64
    } else {
        0
    };

    let activity = params.into_activity(agg_count);
    ctx.store.save(&activity).await?;

    Ok(Some(activity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::LogicalEvent;
    use crate::transformations::testing::{metadata, TestHarness};

    fn reaction_params(index: u32, account: &str) -> ActivityParams {
        let meta = metadata(LogicalEvent::PostReactionCreated, 5, index);
        ActivityParams {
            post_id: Some("10".into()),
            reaction_id: Some(format!("r{}", index)),
            ..ActivityParams::new(EventName::PostReactionCreated, &meta, account)
        }
    }

    #[test]
    fn test_every_name_has_a_group() {
        for name in EventName::ALL {
            let _ = group_key(*name).field();
        }
        assert_eq!(group_key(EventName::AccountFollowed), GroupKey::FollowingAccount);
        assert_eq!(group_key(EventName::ExtensionDonationCreated), GroupKey::Post);
    }

    #[tokio::test]
    async fn test_counting_group_flips_aggregated() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();

        let first = set_activity(&ctx, reaction_params(1, "5A")).await.unwrap().unwrap();
        assert!(first.aggregated);
        assert_eq!(first.agg_count, 1);

        let second = set_activity(&ctx, reaction_params(2, "5B")).await.unwrap().unwrap();
        assert_eq!(second.agg_count, 2);

        let first = harness.store.get::<Activity>(&first.id).await.unwrap().unwrap();
        assert!(!first.aggregated);
        let aggregated = harness
            .store
            .count::<Activity>(&Filter::eq("aggregated", true))
            .await
            .unwrap();
        assert_eq!(aggregated, 1);
    }

    #[tokio::test]
    async fn test_non_counting_event_has_zero_count() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();
        let meta = metadata(LogicalEvent::PostCreated, 1, 0);

        for index in 0..2 {
            let meta = metadata(LogicalEvent::PostCreated, 1, index);
            let params = ActivityParams {
                post_id: Some("10".into()),
                ..ActivityParams::new(EventName::PostUpdated, &meta, "5A")
            };
            let activity = set_activity(&ctx, params).await.unwrap().unwrap();
            assert_eq!(activity.agg_count, 0);
        }

        let params = ActivityParams::new(EventName::PostCreated, &meta, "5A");
        assert!(set_activity(&ctx, params).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replaying_same_event_does_not_count_itself() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();

        let first = set_activity(&ctx, reaction_params(1, "5A")).await.unwrap().unwrap();
        let again = set_activity(&ctx, reaction_params(1, "5A")).await.unwrap().unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.agg_count, 1);
    }
}
