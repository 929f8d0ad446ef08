//! Unified error types for the Braze core framework.
//!
//! This module provides standardized error types used across core components.
//! Runtime-level errors (configuration, startup) are defined in braze-runtime.

use thiserror::Error;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors that can occur when talking to the gateway client.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The client is not connected.
    #[error("gateway client is not connected")]
    NotConnected,

    /// An outbound send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Fetching the channel enumeration failed.
    #[error("failed to fetch channels: {0}")]
    FetchFailed(String),

    /// Other gateway error.
    #[error("{0}")]
    Other(String),
}

/// Result type for gateway client operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// Directory Store Errors
// =============================================================================

/// Errors that can occur in directory persistence.
///
/// These are always logged and absorbed by the
/// [`ChannelDirectory`](super::directory::ChannelDirectory); a broken store
/// must never break dispatch.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Failed to serialize/deserialize the mapping.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for directory store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Send Errors
// =============================================================================

/// Errors that can occur when sending to a named channel.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The channel name is not in the directory.
    ///
    /// This is an explicit result, not an exception: the handler decides the
    /// user-facing behavior for an unresolved name.
    #[error("channel '{name}' is not in the directory")]
    ChannelNotFound {
        /// The unresolved channel name.
        name: String,
    },

    /// Gateway error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

// =============================================================================
// Handler Errors
// =============================================================================

/// Error surfaced by a failing handler.
///
/// The dispatcher's fallback replies to the triggering event with this
/// error's display message, or a generic message when it is empty.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with the given message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message, or a generic fallback when empty.
    pub fn user_message(&self) -> &str {
        if self.message.is_empty() {
            "Error occurred"
        } else {
            &self.message
        }
    }
}

impl From<GatewayError> for HandlerError {
    fn from(err: GatewayError) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<SendError> for HandlerError {
    fn from(err: SendError) -> Self {
        Self::msg(err.to_string())
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<(), HandlerError>;
