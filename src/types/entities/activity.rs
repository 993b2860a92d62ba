use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::impl_entity;
use crate::types::EventName;

/// One processed event. Rows are only ever touched again to clear
/// `aggregated` when a newer activity of the same group arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Initiator.
    pub account_id: String,
    pub block_number: u64,
    pub event_index: u32,
    pub event: EventName,
    pub space_id: Option<String>,
    pub space_prev_id: Option<String>,
    pub post_id: Option<String>,
    pub reaction_id: Option<String>,
    pub following_account_id: Option<String>,
    pub old_owner_id: Option<String>,
    pub new_owner_id: Option<String>,
    pub extension_id: Option<String>,
    pub username: Option<String>,
    pub date: DateTime<Utc>,
    pub aggregated: bool,
    pub agg_count: u64,
}

impl_entity!(Activity, "activity");

/// `{block}-{index}-{md5(event)}[-{extensionIndex}]`
pub fn activity_id(
    block_number: u64,
    index_in_block: u32,
    event: &str,
    extension_index: Option<usize>,
) -> String {
    let digest = hex::encode(Md5::digest(event.as_bytes()));
    match extension_index {
        Some(index) => format!("{}-{}-{}-{}", block_number, index_in_block, digest, index),
        None => format!("{}-{}-{}", block_number, index_in_block, digest),
    }
}
