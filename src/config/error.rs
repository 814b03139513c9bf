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
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Event bus address must be an http(s) URL")]
    InvalidBusAddress,

    #[error("Invalid connect timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Status URLs must be http(s) URLs")]
    InvalidStatusUrl,

    #[error("Both configuration_url and status_url must be set to load a snapshot")]
    IncompleteStatusEndpoints,

    #[error("Channel capacity must be greater than zero")]
    InvalidChannelCapacity,

    #[error("Shutdown grace period must be greater than zero")]
    InvalidGracePeriod,
}
