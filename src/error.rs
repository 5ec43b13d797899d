//! Error types for the chat relay
//!
//! Defines application-level errors, registry (business-rule) errors
//! and outbound queue errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// These end a single connection (or startup), never the whole process.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal for the connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel send error (fatal - the server actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// A configuration value could not be used
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
}

/// Session registry errors
///
/// Only `UsernameTaken` is reported back to the client; the others are
/// protocol misuse and are dropped by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another registered session already holds the name
    #[error("Username already taken")]
    UsernameTaken,

    /// The session has not bound a username yet
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session already bound a username
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// No session is registered under the given id
    #[error("Unknown session")]
    UnknownSession,
}

/// Outbound queue errors
///
/// Occurs when enqueueing an event for a session fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The session is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            RegistryError::UsernameTaken.to_string(),
            "Username already taken"
        );
        assert_eq!(RegistryError::NotAuthenticated.to_string(), "Not authenticated");
    }

    #[test]
    fn test_invalid_config_message() {
        let err = AppError::InvalidConfig {
            key: "CHAT_RELAY_CLIENT_BUFFER".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for CHAT_RELAY_CLIENT_BUFFER: \"abc\""
        );
    }
}
