//! Transformation system: turns decoded chain events into entity effects.
//!
//! This module provides:
//! - Handler traits and a fixed-order handler registry
//! - A per-batch context with the entity store and prefetched services
//! - The activity ledger with topology-aware event naming
//! - Notification and news-feed fan-out
//! - An engine that runs batches transactionally
//!
//! # Architecture
//!
//! ```text
//! Blocks ──► EventScope ──► TransformationEngine ──► Handlers ──► EntityStore ──► PostgreSQL
//!                                │                      │
//!                                │                      └─► Activity ──► Notifications / NewsFeed
//!                                └─► TransformationContext
//!                                     ├─ Chain variant
//!                                     ├─ Decoded events of the batch
//!                                     ├─ Storage prefetch (domains)
//!                                     ├─ Content resolver (IPFS)
//!                                     └─ Search-index queue
//! ```

pub mod activity;
pub mod content;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod fanout;
pub mod indexing;
pub mod news_feed;
pub mod notifications;
pub mod prefetch;
pub mod registry;
pub mod scope;
pub mod synthetic;
pub mod traits;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use content::ContentResolver;
pub use context::TransformationContext;
pub use engine::{BatchSummary, TransformationEngine};
pub use error::TransformationError;
pub use indexing::IndexingQueue;
pub use prefetch::StoragePrefetch;
pub use registry::{build_registry, TransformationRegistry};
pub use scope::EventScope;
pub use traits::TransformationHandler;
