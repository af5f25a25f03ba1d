//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`default_service`].

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"arcgis"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used by the pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// ArcGIS World Geocoding Service.
    #[serde(rename = "arcgis")]
    ArcGis {
        /// `findAddressCandidates` endpoint.
        find_url: String,
        /// `reverseGeocode` endpoint.
        reverse_url: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// Maximum number of requests in flight at once.
        #[serde(default = "default_concurrent")]
        concurrent_requests: usize,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_concurrent() -> usize {
    10
}

impl GeocodingService {
    /// Maximum number of requests this provider should have in flight.
    #[must_use]
    pub const fn concurrent_requests(&self) -> usize {
        match &self.provider {
            ProviderConfig::ArcGis {
                concurrent_requests,
                ..
            } => *concurrent_requests,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("arcgis", include_str!("../services/arcgis.toml"))];

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns the first enabled service, if any.
#[must_use]
pub fn default_service() -> Option<GeocodingService> {
    all_services().into_iter().find(|s| s.enabled)
}

/// Looks up a service by ID.
#[must_use]
pub fn service_by_id(id: &str) -> Option<GeocodingService> {
    all_services().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        assert_eq!(all_services().len(), SERVICE_TOMLS.len());
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn arcgis_defaults() {
        let service = service_by_id("arcgis").unwrap();
        assert!(service.enabled);
        assert_eq!(service.concurrent_requests(), 10);
        let ProviderConfig::ArcGis {
            find_url,
            reverse_url,
            timeout_secs,
            ..
        } = &service.provider;
        assert!(find_url.ends_with("/findAddressCandidates"));
        assert!(reverse_url.ends_with("/reverseGeocode"));
        assert_eq!(*timeout_secs, 10);
    }

    #[test]
    fn default_service_is_enabled() {
        assert!(default_service().is_some_and(|s| s.enabled));
    }

    #[test]
    fn unknown_service_is_none() {
        assert!(service_by_id("nope").is_none());
    }
}
