//! ArcGIS World Geocoding Service client.
//!
//! Uses the keyless `findAddressCandidates` and `reverseGeocode` endpoints
//! of the public `World/GeocodeServer`. Every request carries its own
//! timeout; a slow provider degrades single entries instead of stalling
//! the whole run.
//!
//! See <https://developers.arcgis.com/rest/geocode/api-reference/geocoding-find-address-candidates.htm>

use std::time::Duration;

use async_trait::async_trait;
use raid_map_report_models::Coordinates;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// ArcGIS geocoder bound to a pair of endpoint URLs.
#[derive(Debug, Clone)]
pub struct ArcGisGeocoder {
    client: reqwest::Client,
    find_url: String,
    reverse_url: String,
    timeout: Duration,
}

impl ArcGisGeocoder {
    /// Creates a geocoder for the given endpoints.
    #[must_use]
    pub fn new(client: reqwest::Client, find_url: &str, reverse_url: &str) -> Self {
        Self {
            client,
            find_url: find_url.to_owned(),
            reverse_url: reverse_url.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a geocoder from a registry entry.
    ///
    /// Returns `None` if the service is not an ArcGIS provider.
    #[must_use]
    pub fn from_service(client: reqwest::Client, service: &GeocodingService) -> Option<Self> {
        match &service.provider {
            ProviderConfig::ArcGis {
                find_url,
                reverse_url,
                timeout_secs,
                ..
            } => Some(
                Self::new(client, find_url, reverse_url)
                    .with_timeout(Duration::from_secs(*timeout_secs)),
            ),
        }
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, GeocodeError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Geocoder for ArcGisGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let body = self
            .get_json(
                &self.find_url,
                &[
                    ("singleLine", query),
                    ("f", "json"),
                    ("outFields", "Match_addr"),
                    ("maxLocations", "1"),
                ],
            )
            .await?;
        parse_candidates(&body)
    }

    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<String>, GeocodeError> {
        // ArcGIS takes x,y order.
        let location = format!("{},{}", coordinates.lon, coordinates.lat);
        let body = self
            .get_json(&self.reverse_url, &[("location", location.as_str()), ("f", "json")])
            .await?;
        parse_reverse(&body)
    }
}

/// Surfaces an ArcGIS `{"error": {...}}` body as an error.
fn check_error(body: &serde_json::Value) -> Result<(), GeocodeError> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };

    let code = error
        .get("code")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or_default();
    let message = error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown error");

    Err(GeocodeError::Parse {
        message: format!("ArcGIS error {code}: {message}"),
    })
}

/// Parses a `findAddressCandidates` response, keeping only the first
/// candidate.
fn parse_candidates(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    check_error(body)?;

    let candidates = body
        .get("candidates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "ArcGIS response missing 'candidates' array".to_string(),
        })?;

    let Some(first) = candidates.first() else {
        return Ok(None);
    };

    let lon = first
        .pointer("/location/x")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Candidate missing location.x".to_string(),
        })?;
    let lat = first
        .pointer("/location/y")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Candidate missing location.y".to_string(),
        })?;

    let matched_address = first
        .get("address")
        .and_then(serde_json::Value::as_str)
        .or_else(|| {
            first
                .pointer("/attributes/Match_addr")
                .and_then(serde_json::Value::as_str)
        })
        .map(String::from);

    Ok(Some(GeocodedAddress {
        coordinates: Coordinates::new(lat, lon),
        matched_address,
        score: first.get("score").and_then(serde_json::Value::as_f64),
    }))
}

/// Parses a `reverseGeocode` response into its formatted address.
fn parse_reverse(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    check_error(body)?;

    let Some(address) = body.get("address") else {
        return Ok(None);
    };

    Ok(["Match_addr", "LongLabel"]
        .iter()
        .filter_map(|key| address.get(*key).and_then(serde_json::Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(String::from))
}
