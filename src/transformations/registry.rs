//! Handler registration system.
//!
//! The registry keeps handlers in registration order, which is also the
//! order the engine runs them in within a batch.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::TransformationHandler;
use crate::decoding::LogicalEvent;

/// Registry of all transformation handlers, built at startup.
pub struct TransformationRegistry {
    /// Handlers indexed by trigger for fast lookup
    by_trigger: HashMap<LogicalEvent, Vec<Arc<dyn TransformationHandler>>>,
    /// All handlers in registration order
    all_handlers: Vec<Arc<dyn TransformationHandler>>,
}

impl TransformationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_trigger: HashMap::new(),
            all_handlers: Vec::new(),
        }
    }

    /// Register a handler for all of its triggers.
    pub fn register_handler<H: TransformationHandler>(&mut self, handler: H) {
        let handler: Arc<dyn TransformationHandler> = Arc::new(handler);
        for trigger in handler.triggers() {
            self.by_trigger
                .entry(*trigger)
                .or_default()
                .push(handler.clone());
        }
        self.all_handlers.push(handler);
    }

    /// Get handlers for a specific event.
    pub fn handlers_for_event(&self, event: LogicalEvent) -> &[Arc<dyn TransformationHandler>] {
        self.by_trigger.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All registered triggers.
    pub fn all_triggers(&self) -> Vec<LogicalEvent> {
        let mut triggers: Vec<_> = self.by_trigger.keys().copied().collect();
        triggers.sort();
        triggers
    }

    /// All handlers in run order.
    pub fn all_handlers(&self) -> &[Arc<dyn TransformationHandler>] {
        &self.all_handlers
    }

    /// Check if any handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.all_handlers.is_empty()
    }

    /// Get count of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.all_handlers.len()
    }
}

impl Default for TransformationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the transformation registry with all handlers.
pub fn build_registry() -> TransformationRegistry {
    let mut registry = TransformationRegistry::new();

    super::event::register_handlers(&mut registry);

    tracing::info!(
        "Built transformation registry with {} handlers ({} event triggers)",
        registry.handler_count(),
        registry.all_triggers().len()
    );

    registry
}
