//! HTTP status collaborator.
//!
//! Buildings and rooms come from the configuration database service, room
//! status from the status API:
//!
//! - `GET {configuration_url}/buildings`
//! - `GET {configuration_url}/buildings/{building}/rooms`
//! - `GET {status_url}/buildings/{building}/rooms/{room}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ports::{BuildingInfo, RoomInfo, RoomStatus, RoomStatusSource, StatusSourceError};

/// Reads buildings, rooms and room status over HTTP.
pub struct HttpRoomStatusSource {
    configuration_url: Url,
    status_url: Url,
    client: Client,
}

impl HttpRoomStatusSource {
    /// Creates a source; fails if a base URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(
        configuration_url: impl Into<String>,
        status_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StatusSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatusSourceError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            configuration_url: parse_base(configuration_url.into())?,
            status_url: parse_base(status_url.into())?,
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StatusSourceError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StatusSourceError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StatusSourceError::NotFound(url.into())),
            status if !status.is_success() => {
                return Err(StatusSourceError::Status {
                    status: status.as_u16(),
                    url: url.into(),
                })
            }
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StatusSourceError::Decode(e.to_string()))
    }
}

fn parse_base(url: String) -> Result<Url, StatusSourceError> {
    let parsed = Url::parse(&url)
        .map_err(|e| StatusSourceError::Request(format!("invalid base URL {}: {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(StatusSourceError::Request(format!("invalid base URL {}", url)));
    }
    Ok(parsed)
}

/// Appends `segments` to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[async_trait]
impl RoomStatusSource for HttpRoomStatusSource {
    async fn list_buildings(&self) -> Result<Vec<BuildingInfo>, StatusSourceError> {
        self.get_json(endpoint(&self.configuration_url, &["buildings"]))
            .await
    }

    async fn list_rooms(&self, building: &str) -> Result<Vec<RoomInfo>, StatusSourceError> {
        self.get_json(endpoint(
            &self.configuration_url,
            &["buildings", building, "rooms"],
        ))
        .await
    }

    async fn get_room_status(
        &self,
        building: &str,
        room: &str,
    ) -> Result<RoomStatus, StatusSourceError> {
        let document: Value = self
            .get_json(endpoint(
                &self.status_url,
                &["buildings", building, "rooms", room],
            ))
            .await?;
        Ok(RoomStatus::from_document(building, room, document))
    }
}
