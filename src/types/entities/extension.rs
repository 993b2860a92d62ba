use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::impl_entity;
use crate::types::EventName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionSchemaId {
    #[serde(rename = "subsocial-donations")]
    Donations,
    #[serde(rename = "subsocial-evm-nft")]
    EvmNft,
    #[serde(rename = "subsocial-image")]
    Image,
    #[serde(rename = "subsocial-secret-box")]
    SecretBox,
    #[serde(rename = "subsocial-pinned-posts")]
    PinnedPosts,
}

impl ExtensionSchemaId {
    pub fn event_name(&self) -> EventName {
        match self {
            ExtensionSchemaId::Donations => EventName::ExtensionDonationCreated,
            ExtensionSchemaId::EvmNft => EventName::ExtensionEvmNftShared,
            ExtensionSchemaId::Image => EventName::ExtensionImageCreated,
            ExtensionSchemaId::SecretBox => EventName::ExtensionSecretBoxCreated,
            ExtensionSchemaId::PinnedPosts => EventName::ExtensionPinnedResourcesCreated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentExtension {
    /// `{postId}-{index}`
    pub id: String,
    pub post_id: String,
    pub created_by_account_id: String,
    pub schema_id: ExtensionSchemaId,
    /// Substrate account addressed by donation or secret-box extensions.
    pub recipient_account_id: Option<String>,
    pub properties: JsonValue,
}

impl_entity!(ContentExtension, "content_extension");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPinnedResource {
    /// `{extensionId}-{resourceId}`
    pub id: String,
    pub content_extension_id: String,
    pub resource_post_id: Option<String>,
    pub resource_space_id: Option<String>,
}

impl_entity!(ExtensionPinnedResource, "extension_pinned_resource");
