//! News-feed fan-out.
//!
//! Feeds hold top-level posts from followed accounts and spaces. Rows are
//! keyed `{account}-{activity}` so replaying an event rewrites the same rows.

use std::collections::BTreeSet;

use super::context::TransformationContext;
use super::error::TransformationError;
use super::fanout::{self, FanOut};
use crate::db::Filter;
use crate::types::entities::{Activity, NewsFeed};
use crate::types::EventName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTarget {
    /// Followers of the post's owner.
    PostOwnerFollowers,
    /// Followers of the post's current space.
    PostSpaceFollowers,
    /// Followers of the space the post was moved out of.
    PreviousSpaceFollowers,
    /// The account that unfollowed.
    FollowerAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAction {
    Add(FeedTarget),
    /// Remove the post's rows from the targets' feeds.
    Delete(FeedTarget),
    /// As `Delete`, sparing accounts that follow the post's owner.
    DeleteUnlessFollowingOwner(FeedTarget),
    /// Remove rows initiated by the unfollowed account, sparing those about
    /// spaces the target still follows.
    DeleteAboutAccount(FeedTarget),
    /// Remove rows about the unfollowed space, sparing those initiated by
    /// accounts the target still follows.
    DeleteAboutSpace(FeedTarget),
}

pub fn feed_actions(event: EventName) -> &'static [FeedAction] {
    use EventName::*;
    use FeedAction::*;
    use FeedTarget::*;

    match event {
        PostCreated => &[Add(PostOwnerFollowers), Add(PostSpaceFollowers)],
        PostMoved => &[
            Add(PostSpaceFollowers),
            DeleteUnlessFollowingOwner(PreviousSpaceFollowers),
        ],
        PostDeleted | CommentDeleted | CommentReplyDeleted => {
            &[Delete(PostOwnerFollowers), Delete(PreviousSpaceFollowers)]
        }
        AccountUnfollowed => &[DeleteAboutAccount(FollowerAccount)],
        SpaceUnfollowed => &[DeleteAboutSpace(FollowerAccount)],
        _ => &[],
    }
}

async fn resolve(
    ctx: &TransformationContext<'_>,
    target: FeedTarget,
    activity: &Activity,
    fan_out: &FanOut<'_>,
) -> Result<Option<BTreeSet<String>>, TransformationError> {
    let accounts = match target {
        FeedTarget::PostOwnerFollowers => match fan_out.post {
            Some(post) => Some(fanout::account_followers(ctx, &post.owned_by_account_id).await?),
            None => None,
        },
        FeedTarget::PostSpaceFollowers => match fan_out.post.and_then(|p| p.space_id.as_deref()) {
            Some(space_id) => Some(fanout::space_followers(ctx, space_id).await?),
            None => None,
        },
        FeedTarget::PreviousSpaceFollowers => match fan_out.previous_space_id {
            Some(space_id) => Some(fanout::space_followers(ctx, space_id).await?),
            None => None,
        },
        FeedTarget::FollowerAccount => Some(vec![fan_out
            .follower_account_id
            .unwrap_or(activity.account_id.as_str())
            .to_string()]),
    };

    if accounts.is_none() {
        tracing::debug!("No {:?} for {} feed update {}", target, activity.event, activity.id);
    }
    Ok(accounts.map(|a| a.into_iter().collect()))
}

/// Remove the rows about the fan-out's post from `accounts`' feeds.
async fn delete_post_rows(
    ctx: &TransformationContext<'_>,
    accounts: BTreeSet<String>,
    fan_out: &FanOut<'_>,
) -> Result<(), TransformationError> {
    let Some(post) = fan_out.post else {
        return Ok(());
    };
    let filter = Filter::is_in("account_id", accounts).and(Filter::eq("post_id", post.id.as_str()));
    let rows = ctx.store.find::<NewsFeed>(&filter).await?;
    ctx.store.remove_all(&rows).await?;
    Ok(())
}

/// Apply the feed actions of `activity.event`.
pub async fn handle_news_feed(
    ctx: &TransformationContext<'_>,
    activity: &Activity,
    fan_out: &FanOut<'_>,
) -> Result<(), TransformationError> {
    for action in feed_actions(activity.event) {
        match *action {
            FeedAction::Add(target) => {
                let Some(accounts) = resolve(ctx, target, activity, fan_out).await? else {
                    continue;
                };
                let owner = fan_out.post.map(|p| p.owned_by_account_id.as_str());
                for account in accounts.iter().filter(|a| Some(a.as_str()) != owner) {
                    ctx.store.save(&NewsFeed::new(account, activity)).await?;
                }
            }
            FeedAction::Delete(target) => {
                let Some(accounts) = resolve(ctx, target, activity, fan_out).await? else {
                    continue;
                };
                delete_post_rows(ctx, accounts, fan_out).await?;
            }
            FeedAction::DeleteUnlessFollowingOwner(target) => {
                let (Some(accounts), Some(post)) =
                    (resolve(ctx, target, activity, fan_out).await?, fan_out.post)
                else {
                    continue;
                };
                let mut affected = BTreeSet::new();
                for account in accounts {
                    if account == post.owned_by_account_id
                        || fanout::is_following_account(ctx, &account, &post.owned_by_account_id).await?
                    {
                        continue;
                    }
                    affected.insert(account);
                }
                delete_post_rows(ctx, affected, fan_out).await?;
            }
            FeedAction::DeleteAboutAccount(target) => {
                let (Some(accounts), Some(unfollowed)) = (
                    resolve(ctx, target, activity, fan_out).await?,
                    activity.following_account_id.as_deref(),
                ) else {
                    continue;
                };
                for account in accounts {
                    let filter = Filter::eq("account_id", account.as_str())
                        .and(Filter::eq("initiator_id", unfollowed))
                        .and(Filter::is_in("space_id", fanout::followed_spaces(ctx, &account).await?).not());
                    let rows = ctx.store.find::<NewsFeed>(&filter).await?;
                    ctx.store.remove_all(&rows).await?;
                }
            }
            FeedAction::DeleteAboutSpace(target) => {
                let (Some(accounts), Some(space_id)) = (
                    resolve(ctx, target, activity, fan_out).await?,
                    activity.space_id.as_deref(),
                ) else {
                    continue;
                };
                for account in accounts {
                    let filter = Filter::eq("account_id", account.as_str())
                        .and(Filter::eq("space_id", space_id))
                        .and(Filter::is_in("initiator_id", fanout::followed_accounts(ctx, &account).await?).not());
                    let rows = ctx.store.find::<NewsFeed>(&filter).await?;
                    ctx.store.remove_all(&rows).await?;
                }
            }
        }
    }
    Ok(())
}
