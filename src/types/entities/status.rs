use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

/// Audit row for a content fetch that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpfsFetchLog {
    /// `{cid}-{blockHeight}`
    pub id: String,
    pub cid: String,
    pub block_height: u64,
    pub error_msg: String,
    pub created_at: DateTime<Utc>,
}

impl_entity!(IpfsFetchLog, "ipfs_fetch_log");

/// Last committed block, one row per chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquidStatus {
    pub id: String,
    pub height: u64,
    pub hash: String,
}

impl_entity!(SquidStatus, "squid_status");
