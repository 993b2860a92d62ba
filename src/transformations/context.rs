//! Transformation context.
//!
//! The TransformationContext gives handlers the entity store and the
//! services that were prefetched for the running batch.

use serde::de::DeserializeOwned;

use super::content::{ContentResolver, ContentSection};
use super::error::TransformationError;
use super::indexing::IndexingQueue;
use super::prefetch::StoragePrefetch;
use crate::db::{Entity, EntityStore};
use crate::decoding::{Chain, EventMetadata};
use crate::types::entities::IpfsFetchLog;

/// Context provided to transformation handlers.
pub struct TransformationContext<'a> {
    // ===== Chain Information =====
    pub chain: &'a Chain,

    // ===== Services =====
    pub store: &'a EntityStore,
    pub storage: &'a StoragePrefetch,
    pub content: &'a ContentResolver,
    pub indexing: &'a IndexingQueue,
}

impl<'a> TransformationContext<'a> {
    /// Load an entity another one refers to. A dangling reference is an
    /// error that aborts the batch.
    pub async fn require<E: Entity>(
        &self,
        kind: &'static str,
        id: &str,
        context: &str,
    ) -> Result<E, TransformationError> {
        self.store
            .get::<E>(id)
            .await?
            .ok_or_else(|| TransformationError::missing(kind, id, context))
    }

    /// Off-chain content for `cid`. Failures are logged to `ipfs_fetch_log`
    /// and read as `None`.
    pub async fn content<T: DeserializeOwned>(
        &self,
        section: ContentSection,
        cid: &str,
        metadata: &EventMetadata,
    ) -> Result<Option<T>, TransformationError> {
        match self.content.fetch_content_by_cid::<T>(section, cid).await {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                tracing::warn!(
                    "Content {} unavailable at block {}: {}",
                    cid,
                    metadata.block_number,
                    e
                );
                self.store
                    .save(&IpfsFetchLog {
                        id: format!("{}-{}", cid, metadata.block_number),
                        cid: cid.to_string(),
                        block_height: metadata.block_number,
                        error_msg: e.to_string(),
                        created_at: metadata.timestamp,
                    })
                    .await?;
                Ok(None)
            }
        }
    }
}
