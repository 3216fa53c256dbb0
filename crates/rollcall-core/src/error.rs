//! Core error types for rollcall-core.
//!
//! A single [`CoreError`] is returned from the run pipeline; the narrower
//! enums below carry the detail for configuration, platform and validation
//! failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for rollcall-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chat platform errors (fetch, send, thread lookup)
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A collaborator call exceeded its deadline
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Errors raised by a [`ChatPlatform`](crate::platform::ChatPlatform) implementation.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The platform answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// No bot token available
    #[error("Not authenticated with {service}")]
    NotAuthenticated { service: String },

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Invalid base URL or endpoint path
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Two roster entries share an id
    #[error("Duplicate participant id: {0}")]
    DuplicateParticipantId(String),

    /// Two roster entries share a display name
    #[error("Duplicate participant name: {0}")]
    DuplicateParticipantName(String),

    /// Malformed `id:name` roster entry
    #[error("Invalid roster entry '{entry}': {message}")]
    InvalidRosterEntry { entry: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
