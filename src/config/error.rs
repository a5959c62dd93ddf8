//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout")]
    InvalidTimeout,

    #[error("max_connections must be at least 1")]
    InvalidMaxConnections,

    #[error("Worker grace period must be positive")]
    InvalidGracePeriod,

    #[error("Sample interval must be positive")]
    InvalidSampleInterval,

    #[error("JWT secret must be at least {0} bytes")]
    JwtSecretTooShort(usize),

    #[error("Token lifetimes must be positive")]
    InvalidTokenLifetime,

    #[error("Server URL must start with http:// or https://")]
    InvalidServerUrl,

    #[error("max_attempts must be at least 1")]
    InvalidMaxAttempts,
}
