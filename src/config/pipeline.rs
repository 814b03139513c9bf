//! Pipeline tuning configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Channel and shutdown settings
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Events buffered between reader and aggregator
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Time the aggregator may keep applying buffered events after shutdown, in milliseconds
    #[serde(default = "default_flush_window")]
    pub flush_window_ms: u64,

    /// Time every task gets to stop after shutdown, in seconds
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl PipelineConfig {
    pub fn flush_window(&self) -> Duration {
        Duration::from_millis(self.flush_window_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate pipeline configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        if self.shutdown_grace_secs == 0 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            flush_window_ms: default_flush_window(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_channel_capacity() -> usize {
    crate::application::DEFAULT_CHANNEL_CAPACITY
}

fn default_flush_window() -> u64 {
    2000
}

fn default_shutdown_grace() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.flush_window(), Duration::from_secs(2));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidChannelCapacity));
    }

    #[test]
    fn test_zero_grace_rejected() {
        let config = PipelineConfig {
            shutdown_grace_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidGracePeriod));
    }
}
