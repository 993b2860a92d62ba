use serde_json::Value as JsonValue;

use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;
use crate::types::entities::{SpacePermission, SpacePermissionMap, SpacePermissions};

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceCreatedData {
    pub account_id: String,
    pub space_id: String,
    /// Created by `force_create_space` during a data migration.
    pub forced: bool,
    pub owner_id: Option<String>,
    pub hidden: bool,
    pub content_cid: Option<String>,
    pub permissions: SpacePermissions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceUpdatedData {
    pub account_id: String,
    pub space_id: String,
    /// Outer `None`: not part of the update. `Some(None)`: content cleared.
    pub content_cid: Option<Option<String>>,
    pub hidden: Option<bool>,
    pub permissions: Option<Option<SpacePermissions>>,
}

pub fn space_created_legacy(ctx: &EventContext<'_>) -> Result<SpaceCreatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::positional(args, 0)?)?;
    let space_id = util::id_from_any(util::positional(args, 1)?)?;
    with_create_call(ctx, account_id, space_id)
}

pub fn space_created(ctx: &EventContext<'_>) -> Result<SpaceCreatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::required(args, "account")?)?;
    let space_id = util::id_from_any(util::required(args, "spaceId")?)?;
    with_create_call(ctx, account_id, space_id)
}

fn with_create_call(
    ctx: &EventContext<'_>,
    account_id: String,
    space_id: String,
) -> Result<SpaceCreatedData, DecodeError> {
    let call = ctx.require_call()?;
    let args = &call.args;
    let forced = call.name.ends_with("force_create_space");

    let owner_id = if forced {
        util::opt_account(util::named(args, "owner")?)?
    } else {
        None
    };
    let hidden = if forced {
        util::named(args, "hidden")?.as_bool().unwrap_or(false)
    } else {
        false
    };

    Ok(SpaceCreatedData {
        account_id,
        space_id,
        forced,
        owner_id,
        hidden,
        content_cid: util::content_cid(util::named(args, "content")?)?,
        permissions: permissions(util::named(args, "permissionsOpt")?),
    })
}

pub fn space_updated_legacy(ctx: &EventContext<'_>) -> Result<SpaceUpdatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::positional(args, 0)?)?;
    let space_id = util::id_from_any(util::positional(args, 1)?)?;
    with_update_call(ctx, account_id, space_id)
}

pub fn space_updated(ctx: &EventContext<'_>) -> Result<SpaceUpdatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::required(args, "account")?)?;
    let space_id = util::id_from_any(util::required(args, "spaceId")?)?;
    with_update_call(ctx, account_id, space_id)
}

fn with_update_call(
    ctx: &EventContext<'_>,
    account_id: String,
    space_id: String,
) -> Result<SpaceUpdatedData, DecodeError> {
    let call = ctx.require_call()?;
    let update = util::named(&call.args, "update")?;

    let content_cid = match util::update_field(update, "content") {
        None | Some(JsonValue::Null) => None,
        Some(content) => Some(util::content_cid(content)?),
    };
    let hidden = match util::update_field(update, "hidden") {
        None | Some(JsonValue::Null) => None,
        Some(value) => Some(util::boolean(value)?),
    };
    let permissions = match util::update_field(update, "permissions") {
        None => None,
        Some(JsonValue::Null) => Some(None),
        Some(value) => Some(Some(permissions(value))),
    };

    Ok(SpaceUpdatedData {
        account_id,
        space_id,
        content_cid,
        hidden,
        permissions,
    })
}

/// Role permission sets. Unknown permission names are dropped.
pub fn permissions(value: &JsonValue) -> SpacePermissions {
    let role = |key: &str| -> Option<SpacePermissionMap> {
        let items = value.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|item| util::enum_kind(item))
                .filter_map(|(kind, _)| {
                    serde_json::from_value::<SpacePermission>(JsonValue::String(kind.to_string())).ok()
                })
                .collect(),
        )
    };

    SpacePermissions {
        none: role("none"),
        everyone: role("everyone"),
        follower: role("follower"),
        space_owner: role("spaceOwner"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::raw_data::{BlockHeader, Call, Event};

    fn header() -> BlockHeader {
        BlockHeader {
            height: 5,
            hash: "0x05".into(),
            timestamp: 0,
            spec_version: 27,
        }
    }

    fn event(args: JsonValue) -> Event {
        Event {
            id: "5-1".into(),
            index_in_block: 1,
            name: "Spaces.SpaceUpdated".into(),
            args,
            call_id: Some("5-1".into()),
        }
    }

    fn call(name: &str, args: JsonValue) -> Call {
        Call {
            id: "5-1".into(),
            name: name.into(),
            args,
            origin: None,
            success: true,
        }
    }

    #[test]
    fn test_update_distinguishes_absent_from_cleared() {
        let h = header();
        let e = event(json!({"account": "5Abc", "spaceId": "10"}));
        let c = call(
            "Spaces.update_space",
            json!({"spaceId": "10", "update": {"content": {"__kind": "None"}, "hidden": null, "permissions": null}}),
        );
        let ctx = EventContext { header: &h, event: &e, call: Some(&c) };
        let data = space_updated(&ctx).unwrap();
        assert_eq!(data.content_cid, Some(None));
        assert_eq!(data.hidden, None);
        assert_eq!(data.permissions, Some(None));
    }

    #[test]
    fn test_forced_create_reads_owner() {
        let h = header();
        let e = event(json!(["5Abc", 10]));
        let c = call(
            "Spaces.force_create_space",
            json!({"spaceId": 10, "owner": "5Own", "hidden": true, "content": {"__kind": "None"},
                   "permissionsOpt": {"everyone": [{"__kind": "CreatePosts"}, {"__kind": "Unknown"}], "none": null}}),
        );
        let ctx = EventContext { header: &h, event: &e, call: Some(&c) };
        let data = space_created_legacy(&ctx).unwrap();
        assert!(data.forced);
        assert_eq!(data.owner_id.as_deref(), Some("5Own"));
        assert!(data.hidden);
        assert_eq!(data.permissions.everyone, Some(vec![SpacePermission::CreatePosts]));
        assert_eq!(data.permissions.none, None);
    }
}
