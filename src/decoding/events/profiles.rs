use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdatedData {
    pub account_id: String,
    /// `None` when the profile was reset.
    pub space_id: Option<String>,
}

/// Legacy events only name the account; the profile space comes from
/// `set_profile`, and `reset_profile` clears it.
pub fn profile_updated_legacy(ctx: &EventContext<'_>) -> Result<ProfileUpdatedData, DecodeError> {
    let account_id = util::account(util::positional(ctx.args(), 0)?)?;
    let call = ctx.require_call()?;
    let space_id = if call.name.ends_with("reset_profile") {
        None
    } else {
        util::opt_id(util::named(&call.args, "spaceId")?)?
    };
    Ok(ProfileUpdatedData {
        account_id,
        space_id,
    })
}

pub fn profile_updated(ctx: &EventContext<'_>) -> Result<ProfileUpdatedData, DecodeError> {
    let args = ctx.args();
    Ok(ProfileUpdatedData {
        account_id: util::account(util::required(args, "account")?)?,
        space_id: util::opt_id(util::named(args, "spaceId")?)?,
    })
}
