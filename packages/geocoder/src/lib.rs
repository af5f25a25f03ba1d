#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for raid map entries.
//!
//! Board entries are loosely structured free text. Resolution happens in
//! three steps:
//!
//! 1. [`address::classify`] decides whether an entry is an inline
//!    `(lat,lon)` literal or a free-text address, and picks a best-guess
//!    city token from the latter.
//! 2. [`resolve::forward_geocode`] turns a candidate into coordinates,
//!    calling the [`Geocoder`] only for free-text candidates.
//! 3. [`resolve::reverse_resolve`] recovers a city name for entries that
//!    had coordinates but no city token.
//!
//! The production provider is the ArcGIS World Geocoding Service
//! ([`arcgis`]), configured from the embedded [`service_registry`].

pub mod address;
pub mod arcgis;
pub mod resolve;
pub mod service_registry;

use async_trait::async_trait;
use raid_map_report_models::Coordinates;
use thiserror::Error;

/// A forward geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Where the provider placed the query.
    pub coordinates: Coordinates,
    /// The matched/canonical address returned by the provider.
    pub matched_address: Option<String>,
    /// Provider match score (0-100), if reported.
    pub score: Option<f64>,
}

/// Errors from classification and geocoding.
///
/// None of these abort a pipeline run; each one degrades a single entry.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (including timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The entry looked like a `(lat,lon)` literal but did not parse.
    #[error("Malformed coordinate literal: {entry}")]
    MalformedLiteral {
        /// The offending entry text.
        entry: String,
    },

    /// The provider returned no match.
    #[error("No match")]
    NoMatch,
}

/// A forward and reverse geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-text query, returning the provider's first match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;

    /// Resolves coordinates to the provider's formatted address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<String>, GeocodeError>;
}
