//! Event names recorded on activities and used as fan-out keys.
//!
//! Holds both the names of on-chain events and the synthetic names derived
//! from post topology (`CommentCreated`, `CommentReplyReactionDeleted`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! event_names {
    ($($name:ident),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EventName {
            $($name),*
        }

        impl EventName {
            pub const ALL: &'static [EventName] = &[$(EventName::$name),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventName::$name => stringify!($name)),*
                }
            }
        }

        impl FromStr for EventName {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(EventName::$name),)*
                    other => Err(format!("unknown event name: {}", other)),
                }
            }
        }
    };
}

event_names! {
    PostCreated,
    PostUpdated,
    PostMoved,
    PostDeleted,
    PostFollowed,
    PostUnfollowed,
    PostReactionCreated,
    PostReactionUpdated,
    PostReactionDeleted,
    CommentCreated,
    CommentUpdated,
    CommentDeleted,
    CommentFollowed,
    CommentUnfollowed,
    CommentReactionCreated,
    CommentReactionUpdated,
    CommentReactionDeleted,
    CommentReplyCreated,
    CommentReplyUpdated,
    CommentReplyDeleted,
    CommentReplyReactionCreated,
    CommentReplyReactionUpdated,
    CommentReplyReactionDeleted,
    SpaceCreated,
    SpaceUpdated,
    SpaceFollowed,
    SpaceUnfollowed,
    SpaceOwnershipTransferCreated,
    SpaceOwnershipTransferAccepted,
    SpaceOwnershipTransferRejected,
    PostOwnershipTransferCreated,
    PostOwnershipTransferAccepted,
    PostOwnershipTransferRejected,
    DomainOwnershipTransferCreated,
    DomainOwnershipTransferAccepted,
    DomainOwnershipTransferRejected,
    AccountFollowed,
    AccountUnfollowed,
    ProfileUpdated,
    DomainRegistered,
    DomainMetaUpdated,
    EvmAddressLinkedToAccount,
    EvmAddressUnlinkedFromAccount,
    ExtensionDonationCreated,
    ExtensionEvmNftShared,
    ExtensionImageCreated,
    ExtensionSecretBoxCreated,
    ExtensionPinnedResourcesCreated,
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
