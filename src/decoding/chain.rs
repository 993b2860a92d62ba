//! Chain variants and the pallet capabilities each one exposes.
//!
//! A variant implements only the capability traits for pallets its runtime
//! carries, so asking Soonsocial for domain events does not compile. The
//! [`Chain`] sum type is selected once at startup and routes
//! pallet-qualified event names to the capabilities of the active variant.

use super::error::DecodeError;
use super::events::{
    domains, evm, follows, ownership, posts, profiles, reactions, spaces, AccountFollowData,
    DomainMetaUpdatedData, DomainRegisteredData, EventData, EvmLinkData, LogicalEvent,
    OwnershipData, PostCreatedData, PostFollowData, PostMovedData, PostUpdatedData,
    ProfileUpdatedData, ReactionData, SpaceCreatedData, SpaceFollowData, SpaceUpdatedData,
};
use super::storage::{self, DomainMeta};
use super::versions::{decode_versioned, EventContext, RuntimeSchedule};
use crate::types::config::ChainVariant;

type Decoded = Result<(LogicalEvent, EventData), DecodeError>;

/// Spaces, posts, reactions, account/space follows and profiles. Every
/// variant has these.
pub trait SocialApi: Send + Sync {
    fn schedule(&self) -> RuntimeSchedule;

    fn parse_space_created(&self, ctx: &EventContext<'_>) -> Result<SpaceCreatedData, DecodeError> {
        let table = self.schedule().table(spaces::space_created_legacy, spaces::space_created);
        decode_versioned(ctx, &table)
    }

    fn parse_space_updated(&self, ctx: &EventContext<'_>) -> Result<SpaceUpdatedData, DecodeError> {
        let table = self.schedule().table(spaces::space_updated_legacy, spaces::space_updated);
        decode_versioned(ctx, &table)
    }

    fn parse_post_created(&self, ctx: &EventContext<'_>) -> Result<PostCreatedData, DecodeError> {
        let table = self.schedule().table(posts::post_created_legacy, posts::post_created);
        decode_versioned(ctx, &table)
    }

    fn parse_post_updated(&self, ctx: &EventContext<'_>) -> Result<PostUpdatedData, DecodeError> {
        let table = self.schedule().table(posts::post_updated_legacy, posts::post_updated);
        decode_versioned(ctx, &table)
    }

    fn parse_post_moved(&self, ctx: &EventContext<'_>) -> Result<PostMovedData, DecodeError> {
        let table = self.schedule().table(posts::post_moved_legacy, posts::post_moved);
        decode_versioned(ctx, &table)
    }

    fn parse_post_reaction(&self, ctx: &EventContext<'_>) -> Result<ReactionData, DecodeError> {
        let table = self.schedule().table(reactions::reaction_legacy, reactions::reaction);
        decode_versioned(ctx, &table)
    }

    fn parse_account_follow(&self, ctx: &EventContext<'_>) -> Result<AccountFollowData, DecodeError> {
        let table = self
            .schedule()
            .table(follows::account_follow_legacy, follows::account_follow);
        decode_versioned(ctx, &table)
    }

    fn parse_space_follow(&self, ctx: &EventContext<'_>) -> Result<SpaceFollowData, DecodeError> {
        let table = self.schedule().table(follows::space_follow_legacy, follows::space_follow);
        decode_versioned(ctx, &table)
    }

    fn parse_profile_updated(&self, ctx: &EventContext<'_>) -> Result<ProfileUpdatedData, DecodeError> {
        let table = self
            .schedule()
            .table(profiles::profile_updated_legacy, profiles::profile_updated);
        decode_versioned(ctx, &table)
    }
}

pub trait PostFollowsApi: SocialApi {
    fn parse_post_follow(&self, ctx: &EventContext<'_>) -> Result<PostFollowData, DecodeError> {
        let table = self.schedule().table(follows::post_follow_legacy, follows::post_follow);
        decode_versioned(ctx, &table)
    }
}

pub trait DomainsApi: SocialApi {
    fn parse_domain_registered(&self, ctx: &EventContext<'_>) -> Result<DomainRegisteredData, DecodeError> {
        let table = self
            .schedule()
            .table(domains::domain_registered_legacy, domains::domain_registered);
        decode_versioned(ctx, &table)
    }

    fn parse_domain_meta_updated(
        &self,
        ctx: &EventContext<'_>,
    ) -> Result<DomainMetaUpdatedData, DecodeError> {
        let table = self
            .schedule()
            .table(domains::domain_meta_updated_legacy, domains::domain_meta_updated);
        decode_versioned(ctx, &table)
    }

    fn decode_domain_meta(&self, value: &serde_json::Value) -> Result<DomainMeta, DecodeError> {
        storage::domain_meta(value)
    }
}

pub trait EvmApi: SocialApi {
    fn parse_evm_link(&self, ctx: &EventContext<'_>) -> Result<EvmLinkData, DecodeError> {
        let table = self.schedule().table(evm::evm_link_legacy, evm::evm_link);
        decode_versioned(ctx, &table)
    }
}

/// `SpaceOwnership` pallet, spaces only.
pub trait SpaceOwnershipApi: SocialApi {
    fn parse_space_transfer_created(&self, ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
        let table = self.schedule().table(
            ownership::space_transfer_created_legacy,
            ownership::space_transfer_created,
        );
        decode_versioned(ctx, &table)
    }

    fn parse_space_transfer_resolved(&self, ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
        let table = self.schedule().table(
            ownership::space_transfer_resolved_legacy,
            ownership::space_transfer_resolved,
        );
        decode_versioned(ctx, &table)
    }
}

/// Generic `Ownership` pallet for spaces, posts and domains.
pub trait OwnershipApi: SocialApi {
    fn parse_transfer_created(&self, ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
        decode_versioned(ctx, &self.schedule().named_only(ownership::transfer_created))
    }

    fn parse_transfer_resolved(&self, ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
        decode_versioned(ctx, &self.schedule().named_only(ownership::transfer_resolved))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Subsocial;

#[derive(Debug, Clone, Copy, Default)]
pub struct Soonsocial;

#[derive(Debug, Clone, Copy, Default)]
pub struct Xsocial;

impl SocialApi for Subsocial {
    fn schedule(&self) -> RuntimeSchedule {
        RuntimeSchedule {
            legacy_since: Some(1),
            named_since: 27,
        }
    }
}
impl PostFollowsApi for Subsocial {}
impl DomainsApi for Subsocial {}
impl EvmApi for Subsocial {}
impl SpaceOwnershipApi for Subsocial {}
impl OwnershipApi for Subsocial {}

impl SocialApi for Soonsocial {
    fn schedule(&self) -> RuntimeSchedule {
        RuntimeSchedule {
            legacy_since: Some(1),
            named_since: 17,
        }
    }
}
impl SpaceOwnershipApi for Soonsocial {}

impl SocialApi for Xsocial {
    fn schedule(&self) -> RuntimeSchedule {
        RuntimeSchedule {
            legacy_since: None,
            named_since: 0,
        }
    }
}
impl PostFollowsApi for Xsocial {}
impl EvmApi for Xsocial {}
impl OwnershipApi for Xsocial {}

fn social<A: SocialApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let decoded = match ctx.event.name.as_str() {
        "Spaces.SpaceCreated" => api
            .parse_space_created(ctx)
            .map(|d| (LogicalEvent::SpaceCreated, EventData::SpaceCreated(d))),
        "Spaces.SpaceUpdated" => api
            .parse_space_updated(ctx)
            .map(|d| (LogicalEvent::SpaceUpdated, EventData::SpaceUpdated(d))),
        "Posts.PostCreated" => api
            .parse_post_created(ctx)
            .map(|d| (LogicalEvent::PostCreated, EventData::PostCreated(d))),
        "Posts.PostUpdated" => api
            .parse_post_updated(ctx)
            .map(|d| (LogicalEvent::PostUpdated, EventData::PostUpdated(d))),
        "Posts.PostMoved" => api
            .parse_post_moved(ctx)
            .map(|d| (LogicalEvent::PostMoved, EventData::PostMoved(d))),
        "Reactions.PostReactionCreated" => api
            .parse_post_reaction(ctx)
            .map(|d| (LogicalEvent::PostReactionCreated, EventData::Reaction(d))),
        "Reactions.PostReactionUpdated" => api
            .parse_post_reaction(ctx)
            .map(|d| (LogicalEvent::PostReactionUpdated, EventData::Reaction(d))),
        "Reactions.PostReactionDeleted" => api
            .parse_post_reaction(ctx)
            .map(|d| (LogicalEvent::PostReactionDeleted, EventData::Reaction(d))),
        "AccountFollows.AccountFollowed" => api
            .parse_account_follow(ctx)
            .map(|d| (LogicalEvent::AccountFollowed, EventData::AccountFollow(d))),
        "AccountFollows.AccountUnfollowed" => api
            .parse_account_follow(ctx)
            .map(|d| (LogicalEvent::AccountUnfollowed, EventData::AccountFollow(d))),
        "SpaceFollows.SpaceFollowed" => api
            .parse_space_follow(ctx)
            .map(|d| (LogicalEvent::SpaceFollowed, EventData::SpaceFollow(d))),
        "SpaceFollows.SpaceUnfollowed" => api
            .parse_space_follow(ctx)
            .map(|d| (LogicalEvent::SpaceUnfollowed, EventData::SpaceFollow(d))),
        "Profiles.ProfileUpdated" => api
            .parse_profile_updated(ctx)
            .map(|d| (LogicalEvent::ProfileUpdated, EventData::ProfileUpdated(d))),
        _ => return None,
    };
    Some(decoded)
}

fn post_follows<A: PostFollowsApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let logical = match ctx.event.name.as_str() {
        "PostFollows.PostFollowed" => LogicalEvent::PostFollowed,
        "PostFollows.PostUnfollowed" => LogicalEvent::PostUnfollowed,
        _ => return None,
    };
    Some(api.parse_post_follow(ctx).map(|d| (logical, EventData::PostFollow(d))))
}

fn domain_events<A: DomainsApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let decoded = match ctx.event.name.as_str() {
        "Domains.DomainRegistered" => api
            .parse_domain_registered(ctx)
            .map(|d| (LogicalEvent::DomainRegistered, EventData::DomainRegistered(d))),
        "Domains.DomainMetaUpdated" => api
            .parse_domain_meta_updated(ctx)
            .map(|d| (LogicalEvent::DomainMetaUpdated, EventData::DomainMetaUpdated(d))),
        _ => return None,
    };
    Some(decoded)
}

fn evm_events<A: EvmApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let logical = match ctx.event.name.as_str() {
        "EvmAccounts.EvmAddressLinkedToAccount" => LogicalEvent::EvmAddressLinkedToAccount,
        "EvmAccounts.EvmAddressUnlinkedFromAccount" => LogicalEvent::EvmAddressUnlinkedFromAccount,
        _ => return None,
    };
    Some(api.parse_evm_link(ctx).map(|d| (logical, EventData::EvmLink(d))))
}

fn space_ownership_events<A: SpaceOwnershipApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let decoded = match ctx.event.name.as_str() {
        "SpaceOwnership.SpaceOwnershipTransferCreated" => api
            .parse_space_transfer_created(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferCreated, EventData::Ownership(d))),
        "SpaceOwnership.SpaceOwnershipTransferAccepted" => api
            .parse_space_transfer_resolved(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferAccepted, EventData::Ownership(d))),
        "SpaceOwnership.SpaceOwnershipTransferRejected" => api
            .parse_space_transfer_resolved(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferRejected, EventData::Ownership(d))),
        _ => return None,
    };
    Some(decoded)
}

fn ownership_events<A: OwnershipApi>(api: &A, ctx: &EventContext<'_>) -> Option<Decoded> {
    let decoded = match ctx.event.name.as_str() {
        "Ownership.OwnershipTransferCreated" => api
            .parse_transfer_created(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferCreated, EventData::Ownership(d))),
        "Ownership.OwnershipTransferAccepted" => api
            .parse_transfer_resolved(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferAccepted, EventData::Ownership(d))),
        "Ownership.OwnershipTransferRejected" => api
            .parse_transfer_resolved(ctx)
            .map(|d| (LogicalEvent::OwnershipTransferRejected, EventData::Ownership(d))),
        _ => return None,
    };
    Some(decoded)
}

/// The active chain variant.
#[derive(Debug, Clone, Copy)]
pub enum Chain {
    Subsocial(Subsocial),
    Soonsocial(Soonsocial),
    Xsocial(Xsocial),
}

impl Chain {
    pub fn new(variant: ChainVariant) -> Self {
        match variant {
            ChainVariant::Subsocial => Chain::Subsocial(Subsocial),
            ChainVariant::Soonsocial => Chain::Soonsocial(Soonsocial),
            ChainVariant::Xsocial => Chain::Xsocial(Xsocial),
        }
    }

    pub fn variant(&self) -> ChainVariant {
        match self {
            Chain::Subsocial(_) => ChainVariant::Subsocial,
            Chain::Soonsocial(_) => ChainVariant::Soonsocial,
            Chain::Xsocial(_) => ChainVariant::Xsocial,
        }
    }

    /// Decode one event. `None` for events this variant does not index.
    pub fn parse(&self, ctx: &EventContext<'_>) -> Option<Decoded> {
        match self {
            Chain::Subsocial(api) => social(api, ctx)
                .or_else(|| post_follows(api, ctx))
                .or_else(|| domain_events(api, ctx))
                .or_else(|| evm_events(api, ctx))
                .or_else(|| space_ownership_events(api, ctx))
                .or_else(|| ownership_events(api, ctx)),
            Chain::Soonsocial(api) => {
                social(api, ctx).or_else(|| space_ownership_events(api, ctx))
            }
            Chain::Xsocial(api) => social(api, ctx)
                .or_else(|| post_follows(api, ctx))
                .or_else(|| evm_events(api, ctx))
                .or_else(|| ownership_events(api, ctx)),
        }
    }

    /// Domain storage access, on variants with the `Domains` pallet.
    pub fn domains(&self) -> Option<&dyn DomainsApi> {
        match self {
            Chain::Subsocial(api) => Some(api),
            Chain::Soonsocial(_) | Chain::Xsocial(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as JsonValue};

    use super::*;
    use crate::decoding::events::OwnableEntity;
    use crate::raw_data::{BlockHeader, Event};

    fn parse(chain: Chain, spec_version: u32, name: &str, args: JsonValue) -> Option<Decoded> {
        let header = BlockHeader {
            height: 1,
            hash: "0x01".into(),
            timestamp: 0,
            spec_version,
        };
        let event = Event {
            id: "1-0".into(),
            index_in_block: 0,
            name: name.into(),
            args,
            call_id: None,
        };
        let ctx = EventContext {
            header: &header,
            event: &event,
            call: None,
        };
        chain.parse(&ctx)
    }

    #[test]
    fn test_variants_only_route_their_pallets() {
        let domain = json!({"who": "5Abc", "domain": "alice.sub"});
        assert!(parse(Chain::new(ChainVariant::Subsocial), 40, "Domains.DomainRegistered", domain.clone()).is_some());
        assert!(parse(Chain::new(ChainVariant::Xsocial), 40, "Domains.DomainRegistered", domain.clone()).is_none());
        assert!(parse(Chain::new(ChainVariant::Soonsocial), 40, "Domains.DomainRegistered", domain).is_none());

        let follow = json!({"follower": "5Abc", "postId": "1"});
        assert!(parse(Chain::new(ChainVariant::Soonsocial), 40, "PostFollows.PostFollowed", follow).is_none());
        assert!(parse(Chain::new(ChainVariant::Subsocial), 40, "Balances.Transfer", json!({})).is_none());
        assert!(Chain::new(ChainVariant::Xsocial).domains().is_none());
        assert!(Chain::new(ChainVariant::Subsocial).domains().is_some());
    }

    #[test]
    fn test_legacy_space_ownership_normalises_to_ownership() {
        let decoded = parse(
            Chain::new(ChainVariant::Soonsocial),
            5,
            "SpaceOwnership.SpaceOwnershipTransferCreated",
            json!(["5Old", 10, "5New"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decoded.0, LogicalEvent::OwnershipTransferCreated);
        match decoded.1 {
            EventData::Ownership(data) => {
                assert_eq!(data.entity, OwnableEntity::Space);
                assert_eq!(data.entity_id, "10");
                assert_eq!(data.new_owner_id.as_deref(), Some("5New"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse(
            Chain::new(ChainVariant::Xsocial),
            5,
            "SpaceOwnership.SpaceOwnershipTransferCreated",
            json!(["5Old", 10, "5New"]),
        )
        .is_none());
    }

    #[test]
    fn test_xsocial_rejects_positional_args() {
        let result = parse(
            Chain::new(ChainVariant::Xsocial),
            5,
            "AccountFollows.AccountFollowed",
            json!(["5A", "5B"]),
        )
        .unwrap();
        assert!(matches!(result, Err(DecodeError::UnknownVersion { .. })));

        let (logical, data) = parse(
            Chain::new(ChainVariant::Subsocial),
            5,
            "AccountFollows.AccountFollowed",
            json!(["5A", "5B"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(logical, LogicalEvent::AccountFollowed);
        assert_eq!(
            data,
            EventData::AccountFollow(AccountFollowData {
                follower_id: "5A".into(),
                account_id: "5B".into()
            })
        );
    }
}
