//! Core trait for transformation handlers.
//!
//! Handlers receive decoded events of the running batch and apply their
//! effects through the context's entity store.

use async_trait::async_trait;

use super::context::TransformationContext;
use super::error::TransformationError;
use crate::decoding::{LogicalEvent, ParsedEvent};

/// Core trait that all transformation handlers must implement.
///
/// Handlers are registered at startup in a fixed order and invoked for every
/// event of their triggers, in chain order.
#[async_trait]
pub trait TransformationHandler: Send + Sync + 'static {
    /// Unique name for this handler (used in logging).
    fn name(&self) -> &'static str;

    /// Logical events this handler consumes.
    fn triggers(&self) -> &'static [LogicalEvent];

    /// Apply one event. Writes are buffered in the store until the batch
    /// commits.
    async fn handle(
        &self,
        ctx: &TransformationContext<'_>,
        event: &ParsedEvent,
    ) -> Result<(), TransformationError>;
}
