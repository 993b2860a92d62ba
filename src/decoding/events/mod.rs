//! Logical events and their decoded payloads.
//!
//! One module per pallet. Each exposes a legacy (positional) and a named
//! decoder per event; chain variants assemble them into version tables.

pub mod domains;
pub mod evm;
pub mod follows;
pub mod ownership;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod spaces;

use std::fmt;

use chrono::{DateTime, Utc};

pub use domains::{DomainMetaUpdatedData, DomainRegisteredData};
pub use evm::EvmLinkData;
pub use follows::{AccountFollowData, PostFollowData, SpaceFollowData};
pub use ownership::{OwnableEntity, OwnershipData};
pub use posts::{PostCreatedData, PostMovedData, PostUpdatedData};
pub use profiles::ProfileUpdatedData;
pub use reactions::ReactionData;
pub use spaces::{SpaceCreatedData, SpaceUpdatedData};

/// Chain-independent event identity. Pallet-qualified names of every
/// supported chain variant map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalEvent {
    SpaceCreated,
    SpaceUpdated,
    PostCreated,
    PostUpdated,
    PostMoved,
    PostReactionCreated,
    PostReactionUpdated,
    PostReactionDeleted,
    AccountFollowed,
    AccountUnfollowed,
    SpaceFollowed,
    SpaceUnfollowed,
    PostFollowed,
    PostUnfollowed,
    ProfileUpdated,
    DomainRegistered,
    DomainMetaUpdated,
    EvmAddressLinkedToAccount,
    EvmAddressUnlinkedFromAccount,
    OwnershipTransferCreated,
    OwnershipTransferAccepted,
    OwnershipTransferRejected,
}

impl LogicalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalEvent::SpaceCreated => "SpaceCreated",
            LogicalEvent::SpaceUpdated => "SpaceUpdated",
            LogicalEvent::PostCreated => "PostCreated",
            LogicalEvent::PostUpdated => "PostUpdated",
            LogicalEvent::PostMoved => "PostMoved",
            LogicalEvent::PostReactionCreated => "PostReactionCreated",
            LogicalEvent::PostReactionUpdated => "PostReactionUpdated",
            LogicalEvent::PostReactionDeleted => "PostReactionDeleted",
            LogicalEvent::AccountFollowed => "AccountFollowed",
            LogicalEvent::AccountUnfollowed => "AccountUnfollowed",
            LogicalEvent::SpaceFollowed => "SpaceFollowed",
            LogicalEvent::SpaceUnfollowed => "SpaceUnfollowed",
            LogicalEvent::PostFollowed => "PostFollowed",
            LogicalEvent::PostUnfollowed => "PostUnfollowed",
            LogicalEvent::ProfileUpdated => "ProfileUpdated",
            LogicalEvent::DomainRegistered => "DomainRegistered",
            LogicalEvent::DomainMetaUpdated => "DomainMetaUpdated",
            LogicalEvent::EvmAddressLinkedToAccount => "EvmAddressLinkedToAccount",
            LogicalEvent::EvmAddressUnlinkedFromAccount => "EvmAddressUnlinkedFromAccount",
            LogicalEvent::OwnershipTransferCreated => "OwnershipTransferCreated",
            LogicalEvent::OwnershipTransferAccepted => "OwnershipTransferAccepted",
            LogicalEvent::OwnershipTransferRejected => "OwnershipTransferRejected",
        }
    }
}

impl fmt::Display for LogicalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded event and call arguments merged into one record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    SpaceCreated(SpaceCreatedData),
    SpaceUpdated(SpaceUpdatedData),
    PostCreated(PostCreatedData),
    PostUpdated(PostUpdatedData),
    PostMoved(PostMovedData),
    Reaction(ReactionData),
    AccountFollow(AccountFollowData),
    SpaceFollow(SpaceFollowData),
    PostFollow(PostFollowData),
    ProfileUpdated(ProfileUpdatedData),
    DomainRegistered(DomainRegisteredData),
    DomainMetaUpdated(DomainMetaUpdatedData),
    EvmLink(EvmLinkData),
    Ownership(OwnershipData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventMetadata {
    pub name: LogicalEvent,
    pub block_number: u64,
    pub block_hash: String,
    pub timestamp: DateTime<Utc>,
    pub index_in_block: u32,
    pub spec_version: u32,
}

/// One decoded event of the running batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    /// Archive event id, unique per chain.
    pub id: String,
    pub metadata: EventMetadata,
    pub data: EventData,
}
