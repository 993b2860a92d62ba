use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountFollowData {
    pub follower_id: String,
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceFollowData {
    pub follower_id: String,
    pub space_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostFollowData {
    pub follower_id: String,
    pub post_id: String,
}

pub fn account_follow_legacy(ctx: &EventContext<'_>) -> Result<AccountFollowData, DecodeError> {
    let args = ctx.args();
    Ok(AccountFollowData {
        follower_id: util::account(util::positional(args, 0)?)?,
        account_id: util::account(util::positional(args, 1)?)?,
    })
}

pub fn account_follow(ctx: &EventContext<'_>) -> Result<AccountFollowData, DecodeError> {
    let args = ctx.args();
    Ok(AccountFollowData {
        follower_id: util::account(util::required(args, "follower")?)?,
        account_id: util::account(util::required(args, "account")?)?,
    })
}

pub fn space_follow_legacy(ctx: &EventContext<'_>) -> Result<SpaceFollowData, DecodeError> {
    let args = ctx.args();
    Ok(SpaceFollowData {
        follower_id: util::account(util::positional(args, 0)?)?,
        space_id: util::id_from_any(util::positional(args, 1)?)?,
    })
}

pub fn space_follow(ctx: &EventContext<'_>) -> Result<SpaceFollowData, DecodeError> {
    let args = ctx.args();
    Ok(SpaceFollowData {
        follower_id: util::account(util::required(args, "follower")?)?,
        space_id: util::id_from_any(util::required(args, "spaceId")?)?,
    })
}

pub fn post_follow_legacy(ctx: &EventContext<'_>) -> Result<PostFollowData, DecodeError> {
    let args = ctx.args();
    Ok(PostFollowData {
        follower_id: util::account(util::positional(args, 0)?)?,
        post_id: util::id_from_any(util::positional(args, 1)?)?,
    })
}

pub fn post_follow(ctx: &EventContext<'_>) -> Result<PostFollowData, DecodeError> {
    let args = ctx.args();
    Ok(PostFollowData {
        follower_id: util::account(util::required(args, "follower")?)?,
        post_id: util::id_from_any(util::required(args, "postId")?)?,
    })
}
