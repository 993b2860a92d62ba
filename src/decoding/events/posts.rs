use serde_json::Value as JsonValue;

use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;
use crate::types::entities::PostKind;

#[derive(Debug, Clone, PartialEq)]
pub struct PostCreatedData {
    pub account_id: String,
    pub post_id: String,
    pub space_id: Option<String>,
    pub kind: PostKind,
    pub root_post_id: Option<String>,
    pub parent_post_id: Option<String>,
    pub shared_post_id: Option<String>,
    pub content_cid: Option<String>,
    pub forced: bool,
    pub owner_id: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostUpdatedData {
    pub account_id: String,
    pub post_id: String,
    /// Outer `None`: not part of the update. `Some(None)`: content cleared.
    pub content_cid: Option<Option<String>>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostMovedData {
    pub account_id: String,
    pub post_id: String,
    pub from_space: Option<String>,
    pub to_space: Option<String>,
}

pub fn post_created_legacy(ctx: &EventContext<'_>) -> Result<PostCreatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::positional(args, 0)?)?;
    let post_id = util::id_from_any(util::positional(args, 1)?)?;
    with_create_call(ctx, account_id, post_id)
}

pub fn post_created(ctx: &EventContext<'_>) -> Result<PostCreatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::required(args, "account")?)?;
    let post_id = util::id_from_any(util::required(args, "postId")?)?;
    with_create_call(ctx, account_id, post_id)
}

fn with_create_call(
    ctx: &EventContext<'_>,
    account_id: String,
    post_id: String,
) -> Result<PostCreatedData, DecodeError> {
    let call = ctx.require_call()?;
    let args = &call.args;
    let forced = call.name.ends_with("force_create_post");

    let (kind, root_post_id, parent_post_id, shared_post_id) =
        extension(util::required(args, "extension")?)?;

    Ok(PostCreatedData {
        account_id,
        post_id,
        space_id: util::opt_id(util::named(args, "spaceIdOpt")?)?,
        kind,
        root_post_id,
        parent_post_id,
        shared_post_id,
        content_cid: util::content_cid(util::named(args, "content")?)?,
        forced,
        owner_id: if forced {
            util::opt_account(util::named(args, "owner")?)?
        } else {
            None
        },
        hidden: forced && util::named(args, "hidden")?.as_bool().unwrap_or(false),
    })
}

type Topology = (PostKind, Option<String>, Option<String>, Option<String>);

/// `PostExtension` enum: kind plus root, parent and shared post ids.
fn extension(value: &JsonValue) -> Result<Topology, DecodeError> {
    match util::enum_kind(value) {
        Some(("RegularPost", _)) => Ok((PostKind::RegularPost, None, None, None)),
        Some(("Comment", comment)) => {
            let root = util::id_from_any(util::required(comment, "rootPostId")?)?;
            let parent = util::opt_id(util::named(comment, "parentId")?)?;
            Ok((PostKind::Comment, Some(root), parent, None))
        }
        Some(("SharedPost", original)) => Ok((
            PostKind::SharedPost,
            None,
            None,
            Some(util::id_from_any(original)?),
        )),
        _ => Err(DecodeError::malformed("extension", format!("unexpected value {}", value))),
    }
}

pub fn post_updated_legacy(ctx: &EventContext<'_>) -> Result<PostUpdatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::positional(args, 0)?)?;
    let post_id = util::id_from_any(util::positional(args, 1)?)?;
    with_update_call(ctx, account_id, post_id)
}

pub fn post_updated(ctx: &EventContext<'_>) -> Result<PostUpdatedData, DecodeError> {
    let args = ctx.args();
    let account_id = util::account(util::required(args, "account")?)?;
    let post_id = util::id_from_any(util::required(args, "postId")?)?;
    with_update_call(ctx, account_id, post_id)
}

fn with_update_call(
    ctx: &EventContext<'_>,
    account_id: String,
    post_id: String,
) -> Result<PostUpdatedData, DecodeError> {
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

    Ok(PostUpdatedData {
        account_id,
        post_id,
        content_cid,
        hidden,
    })
}

pub fn post_moved_legacy(ctx: &EventContext<'_>) -> Result<PostMovedData, DecodeError> {
    let args = ctx.args();
    Ok(PostMovedData {
        account_id: util::account(util::positional(args, 0)?)?,
        post_id: util::id_from_any(util::positional(args, 1)?)?,
        from_space: util::opt_id(util::positional(args, 2)?)?,
        to_space: util::opt_id(util::positional(args, 3)?)?,
    })
}

pub fn post_moved(ctx: &EventContext<'_>) -> Result<PostMovedData, DecodeError> {
    let args = ctx.args();
    Ok(PostMovedData {
        account_id: util::account(util::required(args, "account")?)?,
        post_id: util::id_from_any(util::required(args, "postId")?)?,
        from_space: util::opt_id(util::named(args, "fromSpace")?)?,
        to_space: util::opt_id(util::named(args, "toSpace")?)?,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::raw_data::{BlockHeader, Call, Event};

    fn decode(args: JsonValue, call_name: &str, call_args: JsonValue) -> Result<PostCreatedData, DecodeError> {
        let header = BlockHeader {
            height: 9,
            hash: "0x09".into(),
            timestamp: 0,
            spec_version: 27,
        };
        let event = Event {
            id: "9-2".into(),
            index_in_block: 2,
            name: "Posts.PostCreated".into(),
            args,
            call_id: Some("9-2".into()),
        };
        let call = Call {
            id: "9-2".into(),
            name: call_name.into(),
            args: call_args,
            origin: None,
            success: true,
        };
        let ctx = EventContext {
            header: &header,
            event: &event,
            call: Some(&call),
        };
        post_created(&ctx)
    }

    #[test]
    fn test_reply_topology() {
        let data = decode(
            json!({"account": "5Abc", "postId": "3"}),
            "Posts.create_post",
            json!({"spaceIdOpt": null, "extension": {"__kind": "Comment", "value": {"parentId": "2", "rootPostId": "1"}}, "content": {"__kind": "None"}}),
        )
        .unwrap();
        assert_eq!(data.kind, PostKind::Comment);
        assert_eq!(data.root_post_id.as_deref(), Some("1"));
        assert_eq!(data.parent_post_id.as_deref(), Some("2"));
        assert!(!data.forced);
    }

    #[test]
    fn test_shared_post() {
        let data = decode(
            json!({"account": "5Abc", "postId": "4"}),
            "Posts.create_post",
            json!({"spaceIdOpt": "10", "extension": {"__kind": "SharedPost", "value": "1"}, "content": {"__kind": "None"}}),
        )
        .unwrap();
        assert_eq!(data.kind, PostKind::SharedPost);
        assert_eq!(data.shared_post_id.as_deref(), Some("1"));
        assert_eq!(data.space_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_missing_extension_is_malformed() {
        let err = decode(json!({"account": "5Abc", "postId": "4"}), "Posts.create_post", json!({}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }
}
