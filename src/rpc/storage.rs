//! Chain storage reads over an HTTP storage endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;

use super::retry::{check_status, with_retry, RetryConfig, RpcError};
use crate::decoding::StorageSection;

/// Block-scoped chain storage reader.
#[async_trait]
pub trait ChainStorage: Send + Sync {
    /// One value per key, in key order. Missing entries are `None`.
    async fn read_many(
        &self,
        section: StorageSection,
        block_hash: &str,
        keys: &[JsonValue],
    ) -> Result<Vec<Option<JsonValue>>, RpcError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StorageQuery<'a> {
    section: &'static str,
    block_hash: &'a str,
    keys: &'a [JsonValue],
}

pub struct HttpStorageClient {
    http: reqwest::Client,
    endpoint: Url,
    retry: RetryConfig,
}

impl HttpStorageClient {
    pub fn new(url: &str, retry: RetryConfig) -> Result<Self, RpcError> {
        let base = Url::parse(url).map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        let endpoint = base
            .join("storage")
            .map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint,
            retry,
        })
    }
}

#[async_trait]
impl ChainStorage for HttpStorageClient {
    async fn read_many(
        &self,
        section: StorageSection,
        block_hash: &str,
        keys: &[JsonValue],
    ) -> Result<Vec<Option<JsonValue>>, RpcError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = StorageQuery {
            section: section.as_str(),
            block_hash,
            keys,
        };

        let values: Vec<JsonValue> = with_retry(&self.retry, section.as_str(), || async {
            let response = self.http.post(self.endpoint.clone()).json(&query).send().await?;
            Ok(check_status(response).await?.json().await?)
        })
        .await?;

        if values.len() != keys.len() {
            return Err(RpcError::Decode(format!(
                "{} returned {} values for {} keys",
                section.as_str(),
                values.len(),
                keys.len()
            )));
        }
        Ok(values
            .into_iter()
            .map(|v| if v.is_null() { None } else { Some(v) })
            .collect())
    }
}
