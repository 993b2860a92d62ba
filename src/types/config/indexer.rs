use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::types::config::chain::ChainConfig;
use crate::types::config::processing::ProcessingConfig;
use crate::types::config::services::{IpfsConfig, SearchIndexConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    pub chain: ChainConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    pub ipfs: IpfsConfig,
    #[serde(default)]
    pub search_index: SearchIndexConfig,
}

impl IndexerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let mut config: IndexerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        // Relative archive paths resolve against the config file's directory.
        if config.chain.archive_dir.is_relative() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            config.chain.archive_dir = base_dir.join(&config.chain.archive_dir);
        }

        anyhow::ensure!(config.processing.batch_size > 0, "processing.batch_size must be positive");
        anyhow::ensure!(
            config.ipfs.requests_per_second > 0,
            "ipfs.requests_per_second must be positive"
        );

        Ok(config)
    }
}
