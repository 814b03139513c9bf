//! Connection settings shared by the bus login and stream adapters.
//!
//! # Configuration
//!
//! ```ignore
//! let config = BusClientConfig::new("https://salt.example.edu:8000", "svc-roomwatch", password)
//!     .with_eauth("pam")
//!     .with_accept_invalid_certs(true);
//!
//! let authenticator = HttpBusAuthenticator::new(config.clone())?;
//! let source = HttpEventSource::new(config)?;
//! ```

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

/// Address, credentials and TLS policy for the event bus.
#[derive(Debug, Clone)]
pub struct BusClientConfig {
    /// Base URL of the bus API (no trailing slash).
    pub base_url: String,
    pub username: String,
    password: Secret<String>,
    /// External authentication backend named in the login request.
    pub eauth: String,
    /// Skip certificate verification (self-signed bus deployments).
    pub accept_invalid_certs: bool,
    /// Time allowed to establish a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Total time allowed for a login round trip.
    pub login_timeout: Duration,
}

impl BusClientConfig {
    /// Creates a configuration with `pam` auth and certificate checks on.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: Secret::new(password.into()),
            eauth: "pam".to_string(),
            accept_invalid_certs: false,
            connect_timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the external authentication backend.
    pub fn with_eauth(mut self, eauth: impl Into<String>) -> Self {
        self.eauth = eauth.into();
        self
    }

    /// Enables or disables certificate verification.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the login timeout.
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds an HTTP client for this bus.
    ///
    /// No total request timeout is set: the event stream stays open
    /// indefinitely. Login requests carry their own timeout.
    pub(crate) fn build_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
    }
}
