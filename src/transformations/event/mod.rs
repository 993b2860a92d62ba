//! Event handlers, one per pallet.
//!
//! Registration order is run order: later handlers may rely on entities
//! earlier ones created in the same batch.

pub mod account_follows;
pub mod domains;
pub mod evm;
pub mod ownership;
pub mod post_follows;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod space_follows;
pub mod spaces;

use super::registry::TransformationRegistry;

/// Register all event handlers with the registry.
pub fn register_handlers(registry: &mut TransformationRegistry) {
    spaces::register_handlers(registry);
    evm::register_handlers(registry);
    profiles::register_handlers(registry);
    account_follows::register_handlers(registry);
    space_follows::register_handlers(registry);
    posts::register_handlers(registry);
    post_follows::register_handlers(registry);
    domains::register_handlers(registry);
    reactions::register_handlers(registry);
    ownership::register_handlers(registry);
}
