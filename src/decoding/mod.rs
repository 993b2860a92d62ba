//! Chain API adapter: decodes archive events and calls into typed payloads
//! for the active chain variant.

pub mod chain;
pub mod error;
pub mod events;
pub mod storage;
pub mod util;
pub mod versions;

pub use chain::Chain;
pub use error::DecodeError;
pub use events::{EventData, EventMetadata, LogicalEvent, OwnableEntity, ParsedEvent};
pub use storage::{DomainMeta, InnerValue, StorageSection};
pub use versions::EventContext;
