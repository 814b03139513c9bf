//! Status collaborator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where the bulk snapshot comes from
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Base URL of the configuration database service
    pub configuration_url: Option<String>,

    /// Base URL of the room status API
    pub status_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StatusConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Both endpoints, when the snapshot source is configured
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match (self.configuration_url.as_deref(), self.status_url.as_deref()) {
            (Some(configuration), Some(status)) if !configuration.is_empty() && !status.is_empty() => {
                Some((configuration, status))
            }
            _ => None,
        }
    }

    /// Validate status configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let configured = [self.configuration_url.as_deref(), self.status_url.as_deref()]
            .into_iter()
            .flatten()
            .filter(|url| !url.is_empty())
            .collect::<Vec<_>>();

        match configured.len() {
            0 => Ok(()),
            1 => Err(ValidationError::IncompleteStatusEndpoints),
            _ => {
                if configured
                    .iter()
                    .all(|url| url.starts_with("http://") || url.starts_with("https://"))
                {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidStatusUrl)
                }
            }
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            configuration_url: None,
            status_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_is_valid() {
        let config = StatusConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.endpoints().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_both_endpoints() {
        let config = StatusConfig {
            configuration_url: Some("http://config.local".to_string()),
            status_url: Some("https://status.local".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.endpoints(),
            Some(("http://config.local", "https://status.local"))
        );
    }

    #[test]
    fn test_single_endpoint_is_incomplete() {
        let config = StatusConfig {
            status_url: Some("https://status.local".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::IncompleteStatusEndpoints)
        );
    }

    #[test]
    fn test_endpoint_scheme() {
        let config = StatusConfig {
            configuration_url: Some("config.local".to_string()),
            status_url: Some("https://status.local".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStatusUrl));
    }
}
