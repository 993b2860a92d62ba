//! Follow relations and their counters.
//!
//! Each helper writes or removes the relation row and adjusts the counters
//! on the entities passed in. Saving those entities is left to the caller,
//! which usually has more changes to make to them. A follow that already
//! exists, or an unfollow of nothing, changes nothing and returns `false`.

use super::{decrement, increment};
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::{
    Account, AccountFollowers, CommentFollowers, Post, PostFollowers, Space, SpaceFollowers,
};

pub async fn follow_account(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    following: &mut Account,
) -> Result<bool, TransformationError> {
    let id = AccountFollowers::id_for(&follower.id, &following.id);
    if ctx.store.exists::<AccountFollowers>(&id).await? {
        return Ok(false);
    }
    ctx.store
        .save(&AccountFollowers::new(&follower.id, &following.id))
        .await?;
    increment(&mut follower.following_accounts_count);
    increment(&mut following.followers_count);
    Ok(true)
}

pub async fn unfollow_account(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    following: &mut Account,
) -> Result<bool, TransformationError> {
    let id = AccountFollowers::id_for(&follower.id, &following.id);
    let Some(row) = ctx.store.get::<AccountFollowers>(&id).await? else {
        return Ok(false);
    };
    ctx.store.remove(&row).await?;
    decrement(&mut follower.following_accounts_count);
    decrement(&mut following.followers_count);
    Ok(true)
}

pub async fn follow_space(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    space: &mut Space,
) -> Result<bool, TransformationError> {
    let id = SpaceFollowers::id_for(&follower.id, &space.id);
    if ctx.store.exists::<SpaceFollowers>(&id).await? {
        return Ok(false);
    }
    ctx.store.save(&SpaceFollowers::new(&follower.id, &space.id)).await?;
    increment(&mut follower.following_spaces_count);
    increment(&mut space.followers_count);
    Ok(true)
}

pub async fn unfollow_space(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    space: &mut Space,
) -> Result<bool, TransformationError> {
    let id = SpaceFollowers::id_for(&follower.id, &space.id);
    let Some(row) = ctx.store.get::<SpaceFollowers>(&id).await? else {
        return Ok(false);
    };
    ctx.store.remove(&row).await?;
    decrement(&mut follower.following_spaces_count);
    decrement(&mut space.followers_count);
    Ok(true)
}

/// Follow a post, or a comment when `post` has a root.
pub async fn follow_post(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    post: &mut Post,
) -> Result<bool, TransformationError> {
    let created = if post.root_post_id.is_some() {
        let id = CommentFollowers::id_for(&follower.id, &post.id);
        if ctx.store.exists::<CommentFollowers>(&id).await? {
            false
        } else {
            ctx.store.save(&CommentFollowers::new(&follower.id, &post.id)).await?;
            true
        }
    } else {
        let id = PostFollowers::id_for(&follower.id, &post.id);
        if ctx.store.exists::<PostFollowers>(&id).await? {
            false
        } else {
            ctx.store.save(&PostFollowers::new(&follower.id, &post.id)).await?;
            true
        }
    };
    if created {
        increment(&mut follower.following_posts_count);
        increment(&mut post.followers_count);
    }
    Ok(created)
}

pub async fn unfollow_post(
    ctx: &TransformationContext<'_>,
    follower: &mut Account,
    post: &mut Post,
) -> Result<bool, TransformationError> {
    let removed = if post.root_post_id.is_some() {
        let id = CommentFollowers::id_for(&follower.id, &post.id);
        match ctx.store.get::<CommentFollowers>(&id).await? {
            Some(row) => {
                ctx.store.remove(&row).await?;
                true
            }
            None => false,
        }
    } else {
        let id = PostFollowers::id_for(&follower.id, &post.id);
        match ctx.store.get::<PostFollowers>(&id).await? {
            Some(row) => {
                ctx.store.remove(&row).await?;
                true
            }
            None => false,
        }
    };
    if removed {
        decrement(&mut follower.following_posts_count);
        decrement(&mut post.followers_count);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformations::testing::TestHarness;

    #[tokio::test]
    async fn test_follow_is_idempotent_and_unfollow_floors_at_zero() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();
        let mut follower = Account::new("5A");
        let mut space = Space {
            id: "1".into(),
            ..Default::default()
        };

        assert!(follow_space(&ctx, &mut follower, &mut space).await.unwrap());
        assert!(!follow_space(&ctx, &mut follower, &mut space).await.unwrap());
        assert_eq!(space.followers_count, 1);

        assert!(unfollow_space(&ctx, &mut follower, &mut space).await.unwrap());
        assert!(!unfollow_space(&ctx, &mut follower, &mut space).await.unwrap());
        assert_eq!(space.followers_count, 0);
        assert_eq!(follower.following_spaces_count, 0);
    }

    #[tokio::test]
    async fn test_comments_use_comment_followers() {
        let harness = TestHarness::new();
        let ctx = harness.ctx();
        let mut follower = Account::new("5A");
        let mut comment = Post {
            id: "11".into(),
            root_post_id: Some("10".into()),
            ..Default::default()
        };

        follow_post(&ctx, &mut follower, &mut comment).await.unwrap();
        assert!(harness
            .store
            .exists::<CommentFollowers>(&CommentFollowers::id_for("5A", "11"))
            .await
            .unwrap());
        assert!(!harness
            .store
            .exists::<PostFollowers>(&PostFollowers::id_for("5A", "11"))
            .await
            .unwrap());
    }
}
