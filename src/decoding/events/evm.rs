use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;

/// Payload of `EvmAddressLinkedToAccount` and `EvmAddressUnlinkedFromAccount`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvmLinkData {
    pub evm_address: String,
    pub substrate_account: String,
}

pub fn evm_link_legacy(ctx: &EventContext<'_>) -> Result<EvmLinkData, DecodeError> {
    let args = ctx.args();
    Ok(EvmLinkData {
        evm_address: util::account(util::positional(args, 0)?)?,
        substrate_account: util::account(util::positional(args, 1)?)?,
    })
}

pub fn evm_link(ctx: &EventContext<'_>) -> Result<EvmLinkData, DecodeError> {
    let args = ctx.args();
    Ok(EvmLinkData {
        evm_address: util::account(util::required(args, "ethereum")?)?,
        substrate_account: util::account(util::required(args, "substrate")?)?,
    })
}
