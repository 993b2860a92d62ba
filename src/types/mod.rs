pub mod config;
pub mod entities;
pub mod event_name;

pub use event_name::EventName;
