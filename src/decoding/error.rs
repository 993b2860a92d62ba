use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No known runtime version of {name} matches spec version {spec_version}")]
    UnknownVersion { name: String, spec_version: u32 },

    #[error("{name} requires call data but event {event_id} has none")]
    MissingCall { name: String, event_id: String },

    #[error("Malformed {field}: {reason}")]
    Malformed { field: String, reason: String },
}

impl DecodeError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
