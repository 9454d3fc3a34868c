use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    /// A remote integration answered with a non-success status.
    #[error("{message}")]
    Integration { status: u16, message: String },
    #[error("duplicate capability name: {0}")]
    DuplicateCapability(String),
}

impl CapabilityError {
    /// Status code carried by the error, when the failure came from a remote response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Integration { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The bare message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Http(message)
            | Self::Serialization(message)
            | Self::Runtime(message)
            | Self::DuplicateCapability(message) => message,
            Self::Integration { message, .. } => message,
        }
    }
}

impl From<serde_json::Error> for CapabilityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub use crate::Result;
