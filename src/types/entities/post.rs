use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    #[default]
    RegularPost,
    Comment,
    SharedPost,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub kind: PostKind,
    pub is_comment: bool,
    pub hidden: bool,
    pub created_by_account_id: String,
    pub owned_by_account_id: String,
    pub space_id: Option<String>,
    /// Top-level ancestor. Set for comments and replies only.
    pub root_post_id: Option<String>,
    /// Immediate parent. Set for replies only.
    pub parent_post_id: Option<String>,
    pub shared_post_id: Option<String>,
    pub created_at_block: u64,
    pub created_at_time: Option<DateTime<Utc>>,
    pub updated_at_time: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub format: Option<String>,
    pub canonical: Option<String>,
    pub tags: Vec<String>,
    pub replies_count: u32,
    pub public_replies_count: u32,
    pub hidden_replies_count: u32,
    pub reactions_count: u32,
    pub upvotes_count: u32,
    pub downvotes_count: u32,
    pub shares_count: u32,
    pub followers_count: u32,
}

impl_entity!(Post, "post");

impl Post {
    pub fn is_reply(&self) -> bool {
        self.root_post_id.is_some() && self.parent_post_id.is_some()
    }

    pub fn is_top_level_comment(&self) -> bool {
        self.root_post_id.is_some() && self.parent_post_id.is_none()
    }
}
