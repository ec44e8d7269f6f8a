//! Error types for team-pty.

use thiserror::Error;

use crate::SessionId;

/// Main error type for team-pty operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Transport failed to open, send or close
    #[error("Transport error: {0}")]
    Transport(String),

    /// Collaborator API request failed
    #[error("API error: {0}")]
    Api(String),

    /// No signed-in user is available
    #[error("No signed-in user")]
    NotSignedIn,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
