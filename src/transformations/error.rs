//! Transformation error types.

use thiserror::Error;

use crate::db::DbError;
use crate::decoding::{DecodeError, LogicalEvent, ParsedEvent};
use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("Handler '{handler_name}' failed: {message}")]
    HandlerError {
        handler_name: String,
        message: String,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("RPC error: {0}")]
    RpcError(#[from] RpcError),

    /// A required cross-reference could not be resolved. Aborts the batch.
    #[error("{kind} {id} not found ({context})")]
    EntityMissing {
        kind: &'static str,
        id: String,
        context: String,
    },

    #[error("Handler '{handler}' received unexpected payload for {event}")]
    UnexpectedEvent {
        handler: &'static str,
        event: LogicalEvent,
    },
}

impl TransformationError {
    /// Create a handler error with context.
    pub fn handler(name: &str, message: impl Into<String>) -> Self {
        Self::HandlerError {
            handler_name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn unexpected(handler: &'static str, event: &ParsedEvent) -> Self {
        Self::UnexpectedEvent {
            handler,
            event: event.metadata.name,
        }
    }

    pub fn missing(kind: &'static str, id: &str, context: impl Into<String>) -> Self {
        let context = context.into();
        tracing::warn!("EntityProvideFailWarning: {} {} not found ({})", kind, id, context);
        Self::EntityMissing {
            kind,
            id: id.to_string(),
            context,
        }
    }
}
