//! HTTP login adapter for the event bus.
//!
//! `POST {base}/login` with the configured credentials. The bus answers with
//! a `return` list whose first entry holds the token:
//!
//! ```text
//! {"return": [{"token": "6d1b...", "expire": 1700000000.5, "start": 1699956800.5,
//!              "user": "svc-roomwatch", "eauth": "pam", "perms": [".*"]}]}
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::client::BusClientConfig;
use crate::domain::bus::Session;
use crate::domain::foundation::Timestamp;
use crate::ports::{AuthError, BusAuthenticator};

/// Logs into the bus over HTTP.
pub struct HttpBusAuthenticator {
    config: BusClientConfig,
    client: Client,
}

impl HttpBusAuthenticator {
    /// Creates an authenticator; fails only if the HTTP client cannot be built.
    pub fn new(config: BusClientConfig) -> Result<Self, AuthError> {
        let client = config
            .build_client()
            .map_err(|e| AuthError::transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    eauth: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    #[serde(rename = "return", default)]
    entries: Vec<LoginEntry>,
}

#[derive(Debug, Deserialize)]
struct LoginEntry {
    #[serde(default)]
    token: String,
    #[serde(default)]
    expire: Option<f64>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    user: Option<String>,
}

/// Turns a login response body into a session.
fn parse_login_response(body: &str) -> Result<Session, AuthError> {
    let envelope: LoginEnvelope = serde_json::from_str(body)
        .map_err(|e| AuthError::malformed(format!("invalid JSON: {}", e)))?;

    let entry = envelope
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| AuthError::malformed("empty return list"))?;

    if entry.token.trim().is_empty() {
        return Err(AuthError::malformed("missing token"));
    }

    let expire = entry
        .expire
        .ok_or_else(|| AuthError::malformed("missing expire"))?;
    let expires_at = Timestamp::from_unix_secs_f64(expire)
        .ok_or_else(|| AuthError::malformed(format!("invalid expire {}", expire)))?;

    let mut session = Session::new(entry.token, expires_at);
    if let Some(issued_at) = entry.start.and_then(Timestamp::from_unix_secs_f64) {
        session = session.with_issued_at(issued_at);
    }
    Ok(match entry.user {
        Some(user) if !user.is_empty() => session.with_user(user),
        _ => session,
    })
}

#[async_trait]
impl BusAuthenticator for HttpBusAuthenticator {
    async fn login(&self) -> Result<Session, AuthError> {
        let request = LoginRequest {
            username: &self.config.username,
            password: self.config.password(),
            eauth: &self.config.eauth,
        };

        let response = self
            .client
            .post(self.config.url("login"))
            .header("Accept", "application/json")
            .timeout(self.config.login_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let session = parse_login_response(&body)?;
        tracing::debug!(
            user = session.user().unwrap_or(&self.config.username),
            expires_at = %session.expires_at(),
            "Bus login succeeded"
        );
        Ok(session)
    }
}
