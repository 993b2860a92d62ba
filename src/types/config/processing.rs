//! Batch processing configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// PostgreSQL connection string environment variable.
    #[serde(default = "default_database_url_env_var")]
    pub database_url_env_var: String,

    /// Blocks per batch. One batch commits as one transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempts per batch before the processor gives up.
    #[serde(default = "default_max_batch_retries")]
    pub max_batch_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Batches buffered between the block source and the processor.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_database_url_env_var() -> String {
    "DATABASE_URL".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_max_batch_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_channel_capacity() -> usize {
    4
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            database_url_env_var: default_database_url_env_var(),
            batch_size: default_batch_size(),
            max_batch_retries: default_max_batch_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}
