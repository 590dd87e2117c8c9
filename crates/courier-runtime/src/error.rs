//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors from the remote command registration.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request could not be sent or the response not read.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The registrar is missing something it needs.
    #[error("Registrar misconfigured: {0}")]
    Misconfigured(String),
}

/// Result type for registration operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by a gateway connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway rejected the credentials.
    #[error("Gateway authentication failed: {0}")]
    Authentication(String),

    /// The connection could not be established.
    #[error("Gateway connection failed: {0}")]
    Connection(String),

    /// The presence update was rejected.
    #[error("Presence update failed: {0}")]
    Presence(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that stop the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway connection could not be established.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A required runtime component was not provided to the builder.
    #[error("Runtime is missing a {0}")]
    MissingComponent(&'static str),

    /// The command registrar could not be created.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
