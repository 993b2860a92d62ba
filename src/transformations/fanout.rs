//! Recipient resolution shared by the notification and news-feed engines.

use super::context::TransformationContext;
use super::error::TransformationError;
use crate::db::Filter;
use crate::types::entities::{
    AccountFollowers, CommentFollowers, Post, PostFollowers, Space, SpaceFollowers,
};

/// Entities and accounts an activity is about, as known to the handler that
/// produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOut<'a> {
    pub post: Option<&'a Post>,
    pub space: Option<&'a Space>,
    pub following_account_id: Option<&'a str>,
    pub follower_account_id: Option<&'a str>,
    pub old_owner_id: Option<&'a str>,
    pub new_owner_id: Option<&'a str>,
    pub recipient_id: Option<&'a str>,
    pub previous_space_id: Option<&'a str>,
}

/// Load a post referenced during fan-out. Missing posts only skip the
/// recipient they would have produced.
pub async fn load_post(
    ctx: &TransformationContext<'_>,
    id: Option<&str>,
) -> Result<Option<Post>, TransformationError> {
    let Some(id) = id else {
        return Ok(None);
    };
    let post = ctx.store.get::<Post>(id).await?;
    if post.is_none() {
        tracing::warn!("Fan-out skipped: post {} not found", id);
    }
    Ok(post)
}

pub async fn space_owner(
    ctx: &TransformationContext<'_>,
    space_id: Option<&str>,
) -> Result<Option<String>, TransformationError> {
    let Some(id) = space_id else {
        return Ok(None);
    };
    match ctx.store.get::<Space>(id).await? {
        Some(space) => Ok(Some(space.owned_by_account_id)),
        None => {
            tracing::warn!("Fan-out skipped: space {} not found", id);
            Ok(None)
        }
    }
}

/// The post whose author a post event is really about: the shared
/// original for reshares, the post itself otherwise.
pub async fn origin_post(
    ctx: &TransformationContext<'_>,
    post: &Post,
) -> Result<Option<Post>, TransformationError> {
    match post.shared_post_id.as_deref() {
        Some(shared) => load_post(ctx, Some(shared)).await,
        None => Ok(Some(post.clone())),
    }
}

pub async fn account_followers(
    ctx: &TransformationContext<'_>,
    account_id: &str,
) -> Result<Vec<String>, TransformationError> {
    let rows = ctx
        .store
        .find::<AccountFollowers>(&Filter::eq("following_account_id", account_id))
        .await?;
    Ok(rows.into_iter().map(|r| r.follower_account_id).collect())
}

pub async fn space_followers(
    ctx: &TransformationContext<'_>,
    space_id: &str,
) -> Result<Vec<String>, TransformationError> {
    let rows = ctx
        .store
        .find::<SpaceFollowers>(&Filter::eq("following_space_id", space_id))
        .await?;
    Ok(rows.into_iter().map(|r| r.follower_account_id).collect())
}

pub async fn followed_accounts(
    ctx: &TransformationContext<'_>,
    follower: &str,
) -> Result<Vec<String>, TransformationError> {
    let rows = ctx
        .store
        .find::<AccountFollowers>(&Filter::eq("follower_account_id", follower))
        .await?;
    Ok(rows.into_iter().map(|r| r.following_account_id).collect())
}

pub async fn followed_spaces(
    ctx: &TransformationContext<'_>,
    follower: &str,
) -> Result<Vec<String>, TransformationError> {
    let rows = ctx
        .store
        .find::<SpaceFollowers>(&Filter::eq("follower_account_id", follower))
        .await?;
    Ok(rows.into_iter().map(|r| r.following_space_id).collect())
}

/// Posts and comments `follower` follows.
pub async fn followed_posts(
    ctx: &TransformationContext<'_>,
    follower: &str,
) -> Result<Vec<String>, TransformationError> {
    let by_follower = Filter::eq("follower_account_id", follower);
    let mut ids: Vec<String> = ctx
        .store
        .find::<PostFollowers>(&by_follower)
        .await?
        .into_iter()
        .map(|r| r.following_post_id)
        .collect();
    ids.extend(
        ctx.store
            .find::<CommentFollowers>(&by_follower)
            .await?
            .into_iter()
            .map(|r| r.following_comment_id),
    );
    Ok(ids)
}

pub async fn is_following_account(
    ctx: &TransformationContext<'_>,
    follower: &str,
    following: &str,
) -> Result<bool, TransformationError> {
    Ok(ctx
        .store
        .exists::<AccountFollowers>(&AccountFollowers::id_for(follower, following))
        .await?)
}
