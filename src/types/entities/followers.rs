use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountFollowers {
    /// `{followerId}-{followingId}`
    pub id: String,
    pub follower_account_id: String,
    pub following_account_id: String,
}

impl_entity!(AccountFollowers, "account_followers");

impl AccountFollowers {
    pub fn new(follower: &str, following: &str) -> Self {
        Self {
            id: Self::id_for(follower, following),
            follower_account_id: follower.to_string(),
            following_account_id: following.to_string(),
        }
    }

    pub fn id_for(follower: &str, following: &str) -> String {
        format!("{}-{}", follower, following)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceFollowers {
    /// `{followerId}-{spaceId}`
    pub id: String,
    pub follower_account_id: String,
    pub following_space_id: String,
}

impl_entity!(SpaceFollowers, "space_followers");

impl SpaceFollowers {
    pub fn new(follower: &str, space_id: &str) -> Self {
        Self {
            id: Self::id_for(follower, space_id),
            follower_account_id: follower.to_string(),
            following_space_id: space_id.to_string(),
        }
    }

    pub fn id_for(follower: &str, space_id: &str) -> String {
        format!("{}-{}", follower, space_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFollowers {
    /// `{followerId}-{postId}`
    pub id: String,
    pub follower_account_id: String,
    pub following_post_id: String,
}

impl_entity!(PostFollowers, "post_followers");

impl PostFollowers {
    pub fn new(follower: &str, post_id: &str) -> Self {
        Self {
            id: Self::id_for(follower, post_id),
            follower_account_id: follower.to_string(),
            following_post_id: post_id.to_string(),
        }
    }

    pub fn id_for(follower: &str, post_id: &str) -> String {
        format!("{}-{}", follower, post_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentFollowers {
    /// `{followerId}-{commentId}`
    pub id: String,
    pub follower_account_id: String,
    pub following_comment_id: String,
}

impl_entity!(CommentFollowers, "comment_followers");

impl CommentFollowers {
    pub fn new(follower: &str, comment_id: &str) -> Self {
        Self {
            id: Self::id_for(follower, comment_id),
            follower_account_id: follower.to_string(),
            following_comment_id: comment_id.to_string(),
        }
    }

    pub fn id_for(follower: &str, comment_id: &str) -> String {
        format!("{}-{}", follower, comment_id)
    }
}
