//! Event bus configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::event_bus::BusClientConfig;

/// Event bus connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventBusConfig {
    /// Base URL of the bus REST API
    pub address: String,

    /// Login user
    pub username: String,

    /// Login password
    pub password: Secret<String>,

    /// External authentication backend
    #[serde(default = "default_eauth")]
    pub eauth: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Pause before reconnecting, in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl EventBusConfig {
    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get reconnect delay as Duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Settings for the HTTP bus adapters
    pub fn client_config(&self) -> BusClientConfig {
        BusClientConfig::new(
            &self.address,
            &self.username,
            self.password.expose_secret().as_str(),
        )
        .with_eauth(&self.eauth)
        .with_accept_invalid_certs(self.accept_invalid_certs)
        .with_connect_timeout(self.connect_timeout())
    }

    /// Validate event bus configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.address.is_empty() {
            return Err(ValidationError::MissingRequired("EVENT_BUS__ADDRESS"));
        }
        if !self.address.starts_with("http://") && !self.address.starts_with("https://") {
            return Err(ValidationError::InvalidBusAddress);
        }
        if self.username.is_empty() {
            return Err(ValidationError::MissingRequired("EVENT_BUS__USERNAME"));
        }
        if self.password.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("EVENT_BUS__PASSWORD"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_eauth() -> String {
    "pam".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> EventBusConfig {
        EventBusConfig {
            address: "https://salt.example.edu:8000".to_string(),
            username: "svc-roomwatch".to_string(),
            password: Secret::new("hunter2".to_string()),
            eauth: default_eauth(),
            accept_invalid_certs: false,
            connect_timeout_secs: default_connect_timeout(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = valid_config();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.reconnect_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_validation_address_scheme() {
        let config = EventBusConfig {
            address: "salt.example.edu:8000".to_string(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBusAddress));
    }

    #[test]
    fn test_validation_missing_credentials() {
        let config = EventBusConfig {
            username: String::new(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("EVENT_BUS__USERNAME"))
        );

        let config = EventBusConfig {
            password: Secret::new(String::new()),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("EVENT_BUS__PASSWORD"))
        );
    }

    #[test]
    fn test_client_config_carries_tls_policy() {
        let config = EventBusConfig {
            accept_invalid_certs: true,
            eauth: "ldap".to_string(),
            ..valid_config()
        };
        let client = config.client_config();
        assert!(client.accept_invalid_certs);
        assert_eq!(client.eauth, "ldap");
        assert_eq!(client.username, "svc-roomwatch");
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", valid_config()).contains("hunter2"));
    }
}
