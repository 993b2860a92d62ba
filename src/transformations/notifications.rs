//! Notification fan-out.
//!
//! Each event name maps to a fixed list of actions. An action names a role
//! (post owner, space owner, the followed account, ...) that is resolved
//! against the activity into concrete accounts.

use std::collections::BTreeSet;

use super::context::TransformationContext;
use super::error::TransformationError;
use super::fanout::{self, FanOut};
use crate::db::Filter;
use crate::types::entities::{Activity, Notification};
use crate::types::EventName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Owner of the post, or of the shared original for reshares.
    OriginPostOwner,
    /// Owner of the space holding the origin post.
    OriginPostSpaceOwner,
    PostOwner,
    RootPostOwner,
    RootPostSpaceOwner,
    ParentPostOwner,
    SpaceOwner,
    FollowingAccount,
    FollowerAccount,
    InitiatorAccount,
    OldOwner,
    NewOwner,
    DonationRecipient,
    SecretBoxRecipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Notify the target account.
    Add(NotificationTarget),
    /// Notify every follower of the target account.
    AddForFollowers(NotificationTarget),
    /// Remove the target's notifications about the activity's reaction.
    DeleteAboutReaction(NotificationTarget),
    /// Remove the target's notifications about the activity's space, except
    /// those it still receives through another follow.
    DeleteAboutSpace(NotificationTarget),
    /// Remove the target's notifications initiated by the unfollowed
    /// account, except those it still receives through another follow.
    DeleteAboutAccount(NotificationTarget),
}

/// Actions for an event name. Names without notifications map to `&[]`.
pub fn notification_actions(event: EventName) -> &'static [NotificationAction] {
    use EventName::*;
    use NotificationAction::*;
    use NotificationTarget::*;

    match event {
        PostCreated => &[Add(OriginPostOwner), Add(OriginPostSpaceOwner)],
        CommentCreated => &[Add(RootPostOwner), Add(RootPostSpaceOwner)],
        CommentReplyCreated => &[Add(ParentPostOwner), Add(RootPostOwner)],
        PostMoved => &[Add(SpaceOwner)],
        PostReactionCreated | PostReactionUpdated | CommentReactionCreated
        | CommentReactionUpdated | CommentReplyReactionCreated | CommentReplyReactionUpdated => {
            &[Add(PostOwner)]
        }
        PostReactionDeleted | CommentReactionDeleted | CommentReplyReactionDeleted => {
            &[DeleteAboutReaction(PostOwner)]
        }
        PostFollowed | CommentFollowed => &[Add(PostOwner)],
        SpaceFollowed => &[Add(SpaceOwner)],
        SpaceUnfollowed => &[DeleteAboutSpace(FollowerAccount)],
        AccountFollowed => &[Add(FollowingAccount)],
        AccountUnfollowed => &[DeleteAboutAccount(FollowerAccount)],
        SpaceCreated | ProfileUpdated => &[AddForFollowers(InitiatorAccount)],
        SpaceOwnershipTransferCreated | PostOwnershipTransferCreated
        | DomainOwnershipTransferCreated => &[Add(NewOwner)],
        SpaceOwnershipTransferAccepted | SpaceOwnershipTransferRejected
        | PostOwnershipTransferAccepted | PostOwnershipTransferRejected
        | DomainOwnershipTransferAccepted | DomainOwnershipTransferRejected => &[Add(OldOwner)],
        DomainRegistered | EvmAddressLinkedToAccount | EvmAddressUnlinkedFromAccount => {
            &[Add(InitiatorAccount)]
        }
        ExtensionDonationCreated => &[Add(DonationRecipient)],
        ExtensionSecretBoxCreated => &[Add(SecretBoxRecipient)],
        PostUpdated | PostDeleted | PostUnfollowed | CommentUpdated | CommentDeleted
        | CommentUnfollowed | CommentReplyUpdated | CommentReplyDeleted | SpaceUpdated
        | DomainMetaUpdated | ExtensionEvmNftShared | ExtensionImageCreated
        | ExtensionPinnedResourcesCreated => &[],
    }
}

/// Resolve a role to an account. `None` when the activity lacks the
/// context the role needs.
async fn resolve(
    ctx: &TransformationContext<'_>,
    target: NotificationTarget,
    activity: &Activity,
    fan_out: &FanOut<'_>,
) -> Result<Option<String>, TransformationError> {
    use NotificationTarget::*;

    let account = match target {
        OriginPostOwner | OriginPostSpaceOwner => {
            let Some(post) = fan_out.post else {
                return Ok(None);
            };
            let Some(origin) = fanout::origin_post(ctx, post).await? else {
                return Ok(None);
            };
            if target == OriginPostOwner {
                Some(origin.owned_by_account_id)
            } else {
                fanout::space_owner(ctx, origin.space_id.as_deref()).await?
            }
        }
        PostOwner => fan_out.post.map(|p| p.owned_by_account_id.clone()),
        RootPostOwner | RootPostSpaceOwner => {
            let root_id = fan_out.post.and_then(|p| p.root_post_id.as_deref());
            let Some(root) = fanout::load_post(ctx, root_id).await? else {
                return Ok(None);
            };
            if target == RootPostOwner {
                Some(root.owned_by_account_id)
            } else {
                fanout::space_owner(ctx, root.space_id.as_deref()).await?
            }
        }
        ParentPostOwner => {
            let parent_id = fan_out.post.and_then(|p| p.parent_post_id.as_deref());
            fanout::load_post(ctx, parent_id)
                .await?
                .map(|parent| parent.owned_by_account_id)
        }
        SpaceOwner => match fan_out.space {
            Some(space) => Some(space.owned_by_account_id.clone()),
            None => {
                let space_id = fan_out.post.and_then(|p| p.space_id.as_deref());
                fanout::space_owner(ctx, space_id).await?
            }
        },
        FollowingAccount => fan_out
            .following_account_id
            .or(activity.following_account_id.as_deref())
            .map(String::from),
        FollowerAccount => Some(
            fan_out
                .follower_account_id
                .unwrap_or(activity.account_id.as_str())
                .to_string(),
        ),
        InitiatorAccount => Some(activity.account_id.clone()),
        OldOwner => fan_out
            .old_owner_id
            .or(activity.old_owner_id.as_deref())
            .map(String::from),
        NewOwner => fan_out
            .new_owner_id
            .or(activity.new_owner_id.as_deref())
            .map(String::from),
        DonationRecipient | SecretBoxRecipient => fan_out.recipient_id.map(String::from),
    };

    if account.is_none() {
        tracing::warn!(
            "No {:?} for {} notification {}",
            target,
            activity.event,
            activity.id
        );
    }
    Ok(account)
}

/// Apply the notification actions of `activity.event`.
pub async fn handle_notifications(
    ctx: &TransformationContext<'_>,
    activity: &Activity,
    fan_out: &FanOut<'_>,
) -> Result<(), TransformationError> {
    for action in notification_actions(activity.event) {
        match *action {
            NotificationAction::Add(target) => {
                let Some(account) = resolve(ctx, target, activity, fan_out).await? else {
                    continue;
                };
                if account == activity.account_id && target != NotificationTarget::InitiatorAccount {
                    continue;
                }
                ctx.store.save(&Notification::new(&account, activity)).await?;
            }
            NotificationAction::AddForFollowers(target) => {
                let Some(account) = resolve(ctx, target, activity, fan_out).await? else {
                    continue;
                };
                let followers: BTreeSet<String> =
                    fanout::account_followers(ctx, &account).await?.into_iter().collect();
                for follower in followers.iter().filter(|f| **f != activity.account_id) {
                    ctx.store.save(&Notification::new(follower, activity)).await?;
                }
            }
            NotificationAction::DeleteAboutReaction(target) => {
                let (Some(account), Some(reaction_id)) = (
                    resolve(ctx, target, activity, fan_out).await?,
                    activity.reaction_id.as_deref(),
                ) else {
                    continue;
                };
                let filter = Filter::eq("account_id", account).and(Filter::eq("reaction_id", reaction_id));
                let rows = ctx.store.find::<Notification>(&filter).await?;
                ctx.store.remove_all(&rows).await?;
            }
            NotificationAction::DeleteAboutSpace(target) => {
                let (Some(account), Some(space_id)) = (
                    resolve(ctx, target, activity, fan_out).await?,
                    activity.space_id.as_deref(),
                ) else {
                    continue;
                };
                let filter = Filter::eq("account_id", account.as_str())
                    .and(Filter::eq("space_id", space_id))
                    .and(Filter::is_in("initiator_id", fanout::followed_accounts(ctx, &account).await?).not())
                    .and(Filter::is_in("post_id", fanout::followed_posts(ctx, &account).await?).not());
                let rows = ctx.store.find::<Notification>(&filter).await?;
                ctx.store.remove_all(&rows).await?;
            }
            NotificationAction::DeleteAboutAccount(target) => {
                let (Some(account), Some(unfollowed)) = (
                    resolve(ctx, target, activity, fan_out).await?,
                    activity.following_account_id.as_deref(),
                ) else {
                    continue;
                };
                let filter = Filter::eq("account_id", account.as_str())
                    .and(Filter::eq("initiator_id", unfollowed))
                    .and(Filter::is_in("space_id", fanout::followed_spaces(ctx, &account).await?).not())
                    .and(Filter::is_in("post_id", fanout::followed_posts(ctx, &account).await?).not())
                    .and(Filter::eq("following_account_id", account.as_str()).not());
                let rows = ctx.store.find::<Notification>(&filter).await?;
                ctx.store.remove_all(&rows).await?;
            }
        }
    }
    Ok(())
}
