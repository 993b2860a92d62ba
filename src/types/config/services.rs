//! Off-chain collaborators: content gateway and search index.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IpfsConfig {
    pub gateway_url: String,
    #[serde(default = "default_ipfs_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Concurrent fetches during the per-batch prefetch.
    #[serde(default = "default_prefetch_concurrency")]
    pub prefetch_concurrency: usize,
}

fn default_ipfs_timeout_ms() -> u64 {
    5000
}

fn default_requests_per_second() -> u32 {
    50
}

fn default_prefetch_concurrency() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchIndexConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_search_url_env_var")]
    pub url_env_var: String,
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
    #[serde(default = "default_push_batch_size")]
    pub push_batch_size: usize,
}

fn default_search_url_env_var() -> String {
    "ELASTIC_URL".to_string()
}

fn default_index_prefix() -> String {
    "subsocial".to_string()
}

fn default_push_batch_size() -> usize {
    100
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url_env_var: default_search_url_env_var(),
            index_prefix: default_index_prefix(),
            push_batch_size: default_push_batch_size(),
        }
    }
}
