use crate::decoding::error::DecodeError;
use crate::decoding::util;
use crate::decoding::versions::EventContext;

#[derive(Debug, Clone, PartialEq)]
pub struct DomainRegisteredData {
    pub who: String,
    /// Set when registered on behalf of another account.
    pub recipient: Option<String>,
    /// Lowercased full domain, e.g. `alice.sub`.
    pub domain: String,
}

impl DomainRegisteredData {
    pub fn owner(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.who)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainMetaUpdatedData {
    pub who: String,
    pub domain: String,
}

pub fn domain_registered_legacy(ctx: &EventContext<'_>) -> Result<DomainRegisteredData, DecodeError> {
    let args = ctx.args();
    Ok(DomainRegisteredData {
        who: util::account(util::positional(args, 0)?)?,
        recipient: None,
        domain: util::domain_name(util::positional(args, 1)?)?,
    })
}

pub fn domain_registered(ctx: &EventContext<'_>) -> Result<DomainRegisteredData, DecodeError> {
    let args = ctx.args();
    Ok(DomainRegisteredData {
        who: util::account(util::required(args, "who")?)?,
        recipient: util::opt_account(util::named(args, "recipient")?)?,
        domain: util::domain_name(util::required(args, "domain")?)?,
    })
}

pub fn domain_meta_updated_legacy(ctx: &EventContext<'_>) -> Result<DomainMetaUpdatedData, DecodeError> {
    let args = ctx.args();
    Ok(DomainMetaUpdatedData {
        who: util::account(util::positional(args, 0)?)?,
        domain: util::domain_name(util::positional(args, 1)?)?,
    })
}

pub fn domain_meta_updated(ctx: &EventContext<'_>) -> Result<DomainMetaUpdatedData, DecodeError> {
    let args = ctx.args();
    Ok(DomainMetaUpdatedData {
        who: util::account(util::required(args, "who")?)?,
        domain: util::domain_name(util::required(args, "domain")?)?,
    })
}
