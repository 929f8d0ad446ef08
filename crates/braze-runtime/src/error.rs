//! Runtime error types.

use thiserror::Error;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The authentication token is missing from the configuration.
    ///
    /// Raised at build time, before any connection attempt.
    #[error("gateway token is required, check the configuration")]
    MissingToken,

    /// Configuration loading failed.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Handler definitions failed to load.
    #[error("failed to load handlers: {0}")]
    Registry(#[from] braze_core::RegistryError),

    /// Gateway error during startup.
    #[error("gateway error: {0}")]
    Gateway(#[from] braze_core::GatewayError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
