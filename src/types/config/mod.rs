pub mod chain;
pub mod indexer;
pub mod processing;
pub mod services;

pub use chain::{ChainConfig, ChainVariant};
pub use indexer::IndexerConfig;
pub use processing::ProcessingConfig;
pub use services::{IpfsConfig, SearchIndexConfig};
