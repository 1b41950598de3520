//! Common error types for boardsync.

use thiserror::Error;

/// Top-level error type for boardsync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure talking to the remote service.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered with an error.
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A channel or background task is no longer running.
    #[error("Closed: {0}")]
    Closed(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
