//! Off-chain content source backed by an IPFS HTTP gateway.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use url::Url;

use super::retry::{check_status, RpcError, Throttle};
use crate::types::config::IpfsConfig;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] RpcError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("content is not valid JSON: {0}")]
    Parse(String),

    /// An earlier fetch of the same CID in this batch failed.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Raw content by CID.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, cid: &str) -> Result<JsonValue, ContentError>;
}

pub struct IpfsClient {
    http: reqwest::Client,
    gateway: Url,
    throttle: Throttle,
}

impl IpfsClient {
    pub fn new(config: &IpfsConfig) -> Result<Self, RpcError> {
        let gateway = Url::parse(&config.gateway_url).map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        let rps = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| RpcError::InvalidUrl("requests_per_second must be positive".into()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            gateway,
            throttle: Throttle::per_second(rps),
        })
    }

    fn content_url(&self, cid: &str) -> Result<Url, RpcError> {
        self.gateway
            .join(&format!("ipfs/{}", cid))
            .map_err(|e| RpcError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl ContentSource for IpfsClient {
    async fn fetch(&self, cid: &str) -> Result<JsonValue, ContentError> {
        let url = self.content_url(cid)?;
        self.throttle.until_ready().await;

        let response = self.http.get(url).send().await.map_err(RpcError::from)?;
        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(RpcError::from)?;
        serde_json::from_slice(&bytes).map_err(|e| ContentError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_url() {
        let client = IpfsClient::new(&IpfsConfig {
            gateway_url: "https://ipfs.subsocial.network/".into(),
            timeout_ms: 1000,
            requests_per_second: 10,
            prefetch_concurrency: 4,
        })
        .unwrap();
        assert_eq!(
            client.content_url("bafy123").unwrap().as_str(),
            "https://ipfs.subsocial.network/ipfs/bafy123"
        );
    }
}
