use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmAccount {
    /// EIP-55 checksummed address.
    pub id: String,
    pub created_at_block: u64,
    pub created_at_time: Option<DateTime<Utc>>,
}

impl_entity!(EvmAccount, "evm_account");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmSubstrateAccountLink {
    /// `{evmAddress}-{substrateAccount}`
    pub id: String,
    pub evm_account_id: String,
    pub substrate_account_id: String,
    pub active: bool,
    pub created_at_block: u64,
    pub created_at_time: Option<DateTime<Utc>>,
}

impl_entity!(EvmSubstrateAccountLink, "evm_substrate_account_link");

impl EvmSubstrateAccountLink {
    pub fn id_for(evm_address: &str, substrate_account: &str) -> String {
        format!("{}-{}", evm_address, substrate_account)
    }
}
