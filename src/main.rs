mod db;
mod decoding;
mod raw_data;
mod rpc;
mod transformations;
mod types;

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use db::store::PgStore;
use db::{DbPool, EntityStore};
use decoding::Chain;
use raw_data::stream_archive;
use rpc::{ElasticClient, HttpStorageClient, IpfsClient, RetryConfig, SearchIndex};
use transformations::{
    build_registry, ContentResolver, IndexingQueue, StoragePrefetch, TransformationEngine,
};
use types::config::IndexerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = IndexerConfig::load(Path::new("config/config.json"))?;
    load_required_env_vars(&config)?;

    tracing::info!(
        "Loaded config for chain {} ({})",
        config.chain.name,
        config.chain.variant
    );

    let database_url = env::var(&config.processing.database_url_env_var)?;
    let pool = Arc::new(DbPool::new(&database_url).await?);
    pool.run_migrations().await?;
    let store = EntityStore::new(Arc::new(PgStore::new(pool)));

    let chain = Chain::new(config.chain.variant);

    let storage_url = env::var(&config.chain.storage_url_env_var)?;
    let storage = HttpStorageClient::new(&storage_url, RetryConfig::new(config.processing.max_batch_retries))?;
    let ipfs = IpfsClient::new(&config.ipfs)?;

    let search: Option<Arc<dyn SearchIndex>> = if config.search_index.enabled {
        let url = env::var(&config.search_index.url_env_var)?;
        tracing::info!("Search indexing enabled with prefix {}", config.search_index.index_prefix);
        Some(Arc::new(ElasticClient::new(&url, &config.search_index.index_prefix)?))
    } else {
        None
    };

    let engine = TransformationEngine::new(
        Arc::new(build_registry()),
        store,
        chain,
        StoragePrefetch::new(Arc::new(storage)),
        ContentResolver::new(
            Arc::new(ipfs),
            Duration::from_millis(config.ipfs.timeout_ms),
            config.ipfs.prefetch_concurrency,
        ),
        IndexingQueue::new(search, config.search_index.push_batch_size),
        config.chain.name.clone(),
    )
    .with_retries(
        config.processing.max_batch_retries,
        Duration::from_millis(config.processing.retry_delay_ms),
    );

    let after_height = match engine.checkpoint().await? {
        Some(status) => {
            tracing::info!("Resuming {} after block {} ({})", status.id, status.height, status.hash);
            Some(status.height)
        }
        None => config.chain.start_block.and_then(|b| b.checked_sub(1)),
    };

    let (blocks_tx, blocks_rx) = mpsc::channel(config.processing.channel_capacity);
    let archive_dir = config.chain.archive_dir.clone();
    let batch_size = config.processing.batch_size;
    let source = tokio::spawn(async move {
        stream_archive(&archive_dir, after_height, batch_size, blocks_tx).await
    });

    engine.run(blocks_rx).await?;

    let last = source.await.context("Archive reader panicked")??;
    tracing::info!("Archive exhausted at block {}", last);
    Ok(())
}

/// Ensures all required endpoint env vars are set, loading .env if needed.
fn load_required_env_vars(config: &IndexerConfig) -> anyhow::Result<()> {
    let mut required = vec![
        config.processing.database_url_env_var.as_str(),
        config.chain.storage_url_env_var.as_str(),
    ];
    if config.search_index.enabled {
        required.push(config.search_index.url_env_var.as_str());
    }

    let missing: Vec<&&str> = required
        .iter()
        .filter(|var| env::var(var).is_err())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    dotenvy::dotenv().with_context(|| {
        format!(
            "Missing env vars {:?} and failed to load .env file",
            missing
        )
    })?;

    let still_missing: Vec<&str> = required
        .iter()
        .filter(|var| env::var(var).is_err())
        .copied()
        .collect();

    anyhow::ensure!(
        still_missing.is_empty(),
        "Missing required env vars after loading .env: {:?}",
        still_missing
    );

    Ok(())
}
