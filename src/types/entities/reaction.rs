use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionKind {
    #[default]
    Upvote,
    Downvote,
}

/// Reactions are soft-deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionStatus {
    #[default]
    Active,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reaction {
    pub id: String,
    pub post_id: String,
    pub account_id: String,
    pub kind: ReactionKind,
    pub status: ReactionStatus,
    pub created_at_block: u64,
    pub created_at_time: Option<DateTime<Utc>>,
    pub updated_at_time: Option<DateTime<Utc>>,
}

impl_entity!(Reaction, "reaction");
