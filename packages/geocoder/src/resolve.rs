//! Candidate resolution against a [`Geocoder`].
//!
//! Both functions return an explicit `Result` for a single entry. The
//! caller decides how to degrade; nothing here retries.

use raid_map_report_models::{AddressCandidate, Coordinates};

use crate::{GeocodeError, Geocoder};

/// Resolves a candidate to coordinates.
///
/// Literal candidates are returned as-is without touching the network.
/// Textual candidates take the provider's first match.
///
/// # Errors
///
/// Returns [`GeocodeError::NoMatch`] if the provider found nothing, or
/// the provider's own error.
pub async fn forward_geocode<G: Geocoder + ?Sized>(
    geocoder: &G,
    candidate: &AddressCandidate,
) -> Result<Coordinates, GeocodeError> {
    match candidate {
        AddressCandidate::Literal { coordinates } => Ok(*coordinates),
        AddressCandidate::Textual { query, .. } => geocoder
            .geocode(query)
            .await?
            .map(|matched| matched.coordinates)
            .ok_or(GeocodeError::NoMatch),
    }
}

/// Resolves a city name for coordinates that lack one.
///
/// # Errors
///
/// Returns [`GeocodeError::NoMatch`] if the provider has no address for
/// the location, or the provider's own error.
pub async fn reverse_resolve<G: Geocoder + ?Sized>(
    geocoder: &G,
    coordinates: Coordinates,
) -> Result<String, GeocodeError> {
    geocoder
        .reverse_geocode(coordinates)
        .await?
        .as_deref()
        .and_then(city_from_address)
        .ok_or(GeocodeError::NoMatch)
}

/// Takes the first comma-separated segment of a formatted address.
#[must_use]
pub fn city_from_address(address: &str) -> Option<String> {
    address
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
