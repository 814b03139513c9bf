//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ROOMWATCH` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use roomwatch::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Reading events from {}", config.event_bus.address);
//! ```

mod error;
mod event_bus;
mod logging;
mod pipeline;
mod status;
mod store;

pub use error::{ConfigError, ValidationError};
pub use event_bus::EventBusConfig;
pub use logging::LoggingConfig;
pub use pipeline::PipelineConfig;
pub use status::StatusConfig;
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Event bus address and credentials
    pub event_bus: EventBusConfig,

    /// Key-value store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Status collaborator for the startup snapshot
    #[serde(default)]
    pub status: StatusConfig,

    /// Channel sizing and shutdown timing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ROOMWATCH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ROOMWATCH__EVENT_BUS__ADDRESS=https://salt:8000` -> `event_bus.address`
    /// - `ROOMWATCH__STORE__BACKEND=redis` -> `store.backend`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROOMWATCH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.event_bus.validate()?;
        self.store.validate()?;
        self.status.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ROOMWATCH__EVENT_BUS__ADDRESS",
        "ROOMWATCH__EVENT_BUS__USERNAME",
        "ROOMWATCH__EVENT_BUS__PASSWORD",
        "ROOMWATCH__EVENT_BUS__ACCEPT_INVALID_CERTS",
        "ROOMWATCH__STORE__BACKEND",
        "ROOMWATCH__STORE__REDIS_URL",
        "ROOMWATCH__PIPELINE__CHANNEL_CAPACITY",
    ];

    /// Helper to set the required environment variables
    fn set_minimal_env() {
        env::set_var("ROOMWATCH__EVENT_BUS__ADDRESS", "https://salt.example.edu:8000");
        env::set_var("ROOMWATCH__EVENT_BUS__USERNAME", "svc-roomwatch");
        env::set_var("ROOMWATCH__EVENT_BUS__PASSWORD", "hunter2");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.event_bus.address, "https://salt.example.edu:8000");
        assert_eq!(config.event_bus.eauth, "pam");
        assert!(!config.event_bus.accept_invalid_certs);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.pipeline.channel_capacity, 256);
        assert!(config.status.endpoints().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ROOMWATCH__EVENT_BUS__ACCEPT_INVALID_CERTS", "true");
        env::set_var("ROOMWATCH__STORE__BACKEND", "redis");
        env::set_var("ROOMWATCH__STORE__REDIS_URL", "redis://localhost:6379");
        env::set_var("ROOMWATCH__PIPELINE__CHANNEL_CAPACITY", "32");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.event_bus.accept_invalid_certs);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.pipeline.channel_capacity, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("ROOMWATCH__EVENT_BUS__ADDRESS", "https://salt.example.edu:8000");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
