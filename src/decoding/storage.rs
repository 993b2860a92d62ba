//! Chain storage values read during the batch prefetch.

use serde_json::Value as JsonValue;

use super::error::DecodeError;
use super::util;

/// Storage maps the prefetch knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageSection {
    /// `Domains.RegisteredDomains`, keyed by the lowercased domain bytes.
    RegisteredDomains,
}

impl StorageSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageSection::RegisteredDomains => "Domains.RegisteredDomains",
        }
    }
}

/// What a domain resolves to on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InnerValue {
    Account(String),
    Space(String),
    Post(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainMeta {
    pub owner: String,
    pub expires_at: Option<u64>,
    pub content_cid: Option<String>,
    pub inner_value: Option<InnerValue>,
    pub outer_value: Option<String>,
}

pub fn domain_meta(value: &JsonValue) -> Result<DomainMeta, DecodeError> {
    let inner_value = match util::named(value, "innerValue")? {
        JsonValue::Null => None,
        inner => match util::enum_kind(inner) {
            Some(("Account", account)) => Some(InnerValue::Account(util::account(account)?)),
            Some(("Space", id)) => Some(InnerValue::Space(util::id_from_any(id)?)),
            Some(("Post", id)) => Some(InnerValue::Post(util::id_from_any(id)?)),
            _ => return Err(DecodeError::malformed("innerValue", format!("unexpected value {}", inner))),
        },
    };
    let outer_value = match util::named(value, "outerValue")? {
        JsonValue::Null => None,
        outer => Some(util::bytes_to_string(outer)?),
    };

    Ok(DomainMeta {
        owner: util::account(util::required(value, "owner")?)?,
        expires_at: util::named(value, "expiresAt")?.as_u64(),
        content_cid: util::content_cid(util::named(value, "content")?)?,
        inner_value,
        outer_value,
    })
}

/// Storage key for a decoded domain name: its bytes as hex.
pub fn domain_key(domain: &str) -> JsonValue {
    JsonValue::String(format!("0x{}", hex::encode(domain)))
}
