//! Decoded block stream consumed by the processor.

pub mod archive;
pub mod block;

pub use archive::{stream_archive, ArchiveError, ArchiveFile};
pub use block::{Block, BlockHeader, Call, Event};
