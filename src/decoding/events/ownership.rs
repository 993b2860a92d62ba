//! Ownership transfers from the legacy `SpaceOwnership` pallet and the
//! generic `Ownership` pallet, normalised to one payload.

use serde_json::Value as JsonValue;

use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnableEntity {
    Space,
    Post,
    Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipData {
    pub entity: OwnableEntity,
    pub entity_id: String,
    /// Current owner on create; the accepting or rejecting account otherwise.
    pub account_id: String,
    /// Only set on create.
    pub new_owner_id: Option<String>,
}

pub fn space_transfer_created_legacy(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    Ok(OwnershipData {
        entity: OwnableEntity::Space,
        account_id: util::account(util::positional(args, 0)?)?,
        entity_id: util::id_from_any(util::positional(args, 1)?)?,
        new_owner_id: Some(util::account(util::positional(args, 2)?)?),
    })
}

pub fn space_transfer_created(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    Ok(OwnershipData {
        entity: OwnableEntity::Space,
        account_id: util::account(util::required(args, "currentOwner")?)?,
        entity_id: util::id_from_any(util::required(args, "spaceId")?)?,
        new_owner_id: Some(util::account(util::required(args, "newOwner")?)?),
    })
}

/// Accepted and rejected share a shape.
pub fn space_transfer_resolved_legacy(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    Ok(OwnershipData {
        entity: OwnableEntity::Space,
        account_id: util::account(util::positional(args, 0)?)?,
        entity_id: util::id_from_any(util::positional(args, 1)?)?,
        new_owner_id: None,
    })
}

pub fn space_transfer_resolved(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    Ok(OwnershipData {
        entity: OwnableEntity::Space,
        account_id: util::account(util::required(args, "account")?)?,
        entity_id: util::id_from_any(util::required(args, "spaceId")?)?,
        new_owner_id: None,
    })
}

fn ownable(value: &JsonValue) -> Result<(OwnableEntity, String), DecodeError> {
    match util::enum_kind(value) {
        Some(("Space", id)) => Ok((OwnableEntity::Space, util::id_from_any(id)?)),
        Some(("Post", id)) => Ok((OwnableEntity::Post, util::id_from_any(id)?)),
        Some(("Domain", name)) => Ok((OwnableEntity::Domain, util::domain_name(name)?)),
        _ => Err(DecodeError::malformed("entity", format!("unexpected value {}", value))),
    }
}

pub fn transfer_created(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    let (entity, entity_id) = ownable(util::required(args, "entity")?)?;
    Ok(OwnershipData {
        entity,
        entity_id,
        account_id: util::account(util::required(args, "currentOwner")?)?,
        new_owner_id: Some(util::account(util::required(args, "newOwner")?)?),
    })
}

pub fn transfer_resolved(ctx: &EventContext<'_>) -> Result<OwnershipData, DecodeError> {
    let args = ctx.args();
    let (entity, entity_id) = ownable(util::required(args, "entity")?)?;
    Ok(OwnershipData {
        entity,
        entity_id,
        account_id: util::account(util::required(args, "account")?)?,
        new_owner_id: None,
    })
}
