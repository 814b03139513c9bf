//! Store configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Which key-value store backs the aggregate records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory (lost on exit)
    Memory,
    /// One JSON file per room under `path`
    #[default]
    File,
    /// Redis at `redis_url`
    Redis,
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory of the file backend
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Connection URL of the redis backend
    pub redis_url: Option<String>,

    /// Prefix for redis keys
    pub key_prefix: Option<String>,
}

impl StoreConfig {
    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.backend {
            StoreBackend::Memory => Ok(()),
            StoreBackend::File => {
                if self.path.as_os_str().is_empty() {
                    return Err(ValidationError::MissingRequired("STORE__PATH"));
                }
                Ok(())
            }
            StoreBackend::Redis => {
                let url = self
                    .redis_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or(ValidationError::MissingRequired("STORE__REDIS_URL"))?;
                if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                    return Err(ValidationError::InvalidRedisUrl);
                }
                Ok(())
            }
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
            redis_url: None,
            key_prefix: None,
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("/tmp/roomwatch")
}
