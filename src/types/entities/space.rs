use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpacePermission {
    ManageRoles,
    RepresentSpaceInternally,
    RepresentSpaceExternally,
    UpdateSpace,
    CreateSubspaces,
    UpdateOwnSubspaces,
    DeleteOwnSubspaces,
    HideOwnSubspaces,
    UpdateAnySubspace,
    DeleteAnySubspace,
    HideAnySubspace,
    CreatePosts,
    UpdateOwnPosts,
    DeleteOwnPosts,
    HideOwnPosts,
    UpdateAnyPost,
    DeleteAnyPost,
    HideAnyPost,
    CreateComments,
    UpdateOwnComments,
    DeleteOwnComments,
    HideOwnComments,
    HideAnyComment,
    Upvote,
    Downvote,
    Share,
    OverrideSubspacePermissions,
    OverridePostPermissions,
    SuggestEntityStatus,
    UpdateEntityStatus,
    UpdateSpaceSettings,
}

pub type SpacePermissionMap = Vec<SpacePermission>;

/// Permission snapshot per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacePermissions {
    pub none: Option<SpacePermissionMap>,
    pub everyone: Option<SpacePermissionMap>,
    pub follower: Option<SpacePermissionMap>,
    pub space_owner: Option<SpacePermissionMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Space {
    pub id: String,
    pub created_by_account_id: String,
    pub owned_by_account_id: String,
    pub created_at_block: u64,
    pub created_at_time: Option<DateTime<Utc>>,
    pub updated_at_time: Option<DateTime<Utc>>,
    pub hidden: bool,
    /// Content identifier of the off-chain body.
    pub content: Option<String>,
    pub name: Option<String>,
    pub about: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub username: Option<String>,
    pub posts_count: u32,
    pub public_posts_count: u32,
    pub hidden_posts_count: u32,
    pub followers_count: u32,
    pub permissions: SpacePermissions,
}

impl_entity!(Space, "space");
