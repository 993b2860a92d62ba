use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub profile_space_id: Option<String>,
    pub followers_count: u32,
    pub following_accounts_count: u32,
    pub following_spaces_count: u32,
    pub following_posts_count: u32,
    pub owned_posts_count: u32,
    /// Registered domains owned by this account, deduplicated.
    pub usernames: Vec<String>,
    pub created_at_block: Option<u64>,
    pub created_at_time: Option<DateTime<Utc>>,
    pub updated_at_time: Option<DateTime<Utc>>,
}

impl_entity!(Account, "account");

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns false when the username was already present.
    pub fn add_username(&mut self, username: &str) -> bool {
        if self.usernames.iter().any(|u| u == username) {
            return false;
        }
        self.usernames.push(username.to_string());
        true
    }

    pub fn remove_username(&mut self, username: &str) -> bool {
        let before = self.usernames.len();
        self.usernames.retain(|u| u != username);
        before != self.usernames.len()
    }
}
