use serde_json::Value as JsonValue;

use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;
use crate::types::entities::ReactionKind;

/// Payload of `PostReactionCreated`, `PostReactionUpdated` and
/// `PostReactionDeleted`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionData {
    pub account_id: String,
    pub post_id: String,
    pub reaction_id: String,
    /// Unknown for legacy deletions; the handler falls back to the stored
    /// reaction.
    pub kind: Option<ReactionKind>,
}

pub fn reaction_kind(value: &JsonValue) -> Result<ReactionKind, DecodeError> {
    match util::enum_kind(value) {
        Some(("Upvote", _)) => Ok(ReactionKind::Upvote),
        Some(("Downvote", _)) => Ok(ReactionKind::Downvote),
        _ => Err(DecodeError::malformed("reactionKind", format!("unexpected value {}", value))),
    }
}

/// Legacy events carry no kind; create and update take it from the call.
pub fn reaction_legacy(ctx: &EventContext<'_>) -> Result<ReactionData, DecodeError> {
    let args = ctx.args();
    let kind = match ctx.call_args() {
        Some(call_args) => {
            let value = match util::named(call_args, "kind")? {
                JsonValue::Null => util::named(call_args, "newKind")?,
                kind => kind,
            };
            match value {
                JsonValue::Null => None,
                kind => Some(reaction_kind(kind)?),
            }
        }
        None => None,
    };

    Ok(ReactionData {
        account_id: util::account(util::positional(args, 0)?)?,
        post_id: util::id_from_any(util::positional(args, 1)?)?,
        reaction_id: util::id_from_any(util::positional(args, 2)?)?,
        kind,
    })
}

pub fn reaction(ctx: &EventContext<'_>) -> Result<ReactionData, DecodeError> {
    let args = ctx.args();
    Ok(ReactionData {
        account_id: util::account(util::required(args, "account")?)?,
        post_id: util::id_from_any(util::required(args, "postId")?)?,
        reaction_id: util::id_from_any(util::required(args, "reactionId")?)?,
        kind: Some(reaction_kind(util::required(args, "reactionKind")?)?),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::raw_data::{BlockHeader, Call, Event};

    #[test]
    fn test_legacy_kind_comes_from_call() {
        let header = BlockHeader {
            height: 3,
            hash: "0x03".into(),
            timestamp: 0,
            spec_version: 13,
        };
        let event = Event {
            id: "3-0".into(),
            index_in_block: 0,
            name: "Reactions.PostReactionUpdated".into(),
            args: json!(["5Abc", 1, 7]),
            call_id: Some("3-0".into()),
        };
        let call = Call {
            id: "3-0".into(),
            name: "Reactions.update_post_reaction".into(),
            args: json!({"postId": 1, "reactionId": 7, "newKind": {"__kind": "Downvote"}}),
            origin: None,
            success: true,
        };
        let ctx = EventContext {
            header: &header,
            event: &event,
            call: Some(&call),
        };
        let data = reaction_legacy(&ctx).unwrap();
        assert_eq!(data.kind, Some(ReactionKind::Downvote));
        assert_eq!(data.reaction_id, "7");

        let ctx = EventContext {
            header: &header,
            event: &event,
            call: None,
        };
        assert_eq!(reaction_legacy(&ctx).unwrap().kind, None);
    }
}
