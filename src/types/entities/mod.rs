//! Persisted entities. Relations are stored as ids of the related entity.

pub mod account;
pub mod activity;
pub mod evm;
pub mod extension;
pub mod feed;
pub mod followers;
pub mod post;
pub mod reaction;
pub mod space;
pub mod status;

pub use account::Account;
pub use activity::Activity;
pub use evm::{EvmAccount, EvmSubstrateAccountLink};
pub use extension::{ContentExtension, ExtensionPinnedResource, ExtensionSchemaId};
pub use feed::{NewsFeed, Notification};
pub use followers::{AccountFollowers, CommentFollowers, PostFollowers, SpaceFollowers};
pub use post::{Post, PostKind};
pub use reaction::{Reaction, ReactionKind, ReactionStatus};
pub use space::{Space, SpacePermission, SpacePermissionMap, SpacePermissions};
pub use status::{IpfsFetchLog, SquidStatus};

/// Implements [`crate::db::Entity`] for a struct with an `id: String` field.
macro_rules! impl_entity {
    ($ty:ty, $table:literal) => {
        impl $crate::db::Entity for $ty {
            const TABLE: &'static str = $table;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

pub(crate) use impl_entity;
