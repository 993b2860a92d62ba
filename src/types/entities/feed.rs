use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::impl_entity;
use super::Activity;
use crate::types::EventName;

/// Relation keys copied from the originating activity so that fan-out
/// removals can filter rows without joining through `activity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityKeys {
    pub initiator_id: String,
    pub space_id: Option<String>,
    pub post_id: Option<String>,
    pub reaction_id: Option<String>,
    pub following_account_id: Option<String>,
}

impl From<&Activity> for ActivityKeys {
    fn from(activity: &Activity) -> Self {
        Self {
            initiator_id: activity.account_id.clone(),
            space_id: activity.space_id.clone(),
            post_id: activity.post_id.clone(),
            reaction_id: activity.reaction_id.clone(),
            following_account_id: activity.following_account_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// `{accountId}-{activityId}`
    pub id: String,
    pub account_id: String,
    pub activity_id: String,
    pub event: EventName,
    #[serde(flatten)]
    pub keys: ActivityKeys,
    pub created_at: DateTime<Utc>,
}

impl_entity!(Notification, "notification");

impl Notification {
    pub fn new(account_id: &str, activity: &Activity) -> Self {
        Self {
            id: fan_out_id(account_id, &activity.id),
            account_id: account_id.to_string(),
            activity_id: activity.id.clone(),
            event: activity.event,
            keys: ActivityKeys::from(activity),
            created_at: activity.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    /// `{accountId}-{activityId}`
    pub id: String,
    pub account_id: String,
    pub activity_id: String,
    pub event: EventName,
    #[serde(flatten)]
    pub keys: ActivityKeys,
    pub created_at: DateTime<Utc>,
}

impl_entity!(NewsFeed, "news_feed");

impl NewsFeed {
    pub fn new(account_id: &str, activity: &Activity) -> Self {
        Self {
            id: fan_out_id(account_id, &activity.id),
            account_id: account_id.to_string(),
            activity_id: activity.id.clone(),
            event: activity.event,
            keys: ActivityKeys::from(activity),
            created_at: activity.date,
        }
    }
}

pub fn fan_out_id(account_id: &str, activity_id: &str) -> String {
    format!("{}-{}", account_id, activity_id)
}
