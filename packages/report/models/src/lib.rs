#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core data types for the raid map pipeline.
//!
//! Entries scraped from the source board flow through these types in
//! order: [`RawEntry`] → [`AddressCandidate`] → [`GeoResult`], and a full
//! pass over the board is collected into a [`PipelineRun`]. The run is the
//! unit that gets cached and served to the map frontend.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One incident record as displayed on the source board, before any
/// interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEntry(String);

impl RawEntry {
    /// Wraps the given entry text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the entry text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawEntry {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RawEntry {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RawEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// How an entry should be resolved to a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressCandidate {
    /// The entry already encoded a parenthesized `(lat,lon)` pair.
    Literal {
        /// The parsed coordinates.
        coordinates: Coordinates,
    },
    /// Free text that must go through forward geocoding.
    Textual {
        /// The query sent to the geocoding provider (the full entry text).
        query: String,
        /// Best-guess city token taken from the comma-separated parts.
        city_hint: Option<String>,
    },
}

impl AddressCandidate {
    /// Returns the city hint, if the candidate carries one.
    ///
    /// Always `None` for [`AddressCandidate::Literal`].
    #[must_use]
    pub fn city_hint(&self) -> Option<&str> {
        match self {
            Self::Literal { .. } => None,
            Self::Textual { city_hint, .. } => city_hint.as_deref(),
        }
    }
}

/// The resolved outcome for one entry.
///
/// Absent fields serialize as `null`; a failed lookup and a field that
/// was never available look the same to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    /// Position of the entry on the source board (0-based).
    pub id: usize,
    /// Latitude, if resolved.
    pub lat: Option<f64>,
    /// Longitude, if resolved.
    pub lon: Option<f64>,
    /// Human-readable city name, if known.
    pub city: Option<String>,
    /// Date of the pipeline run that produced this record (`YYYY-MM-DD`).
    pub date: NaiveDate,
}

impl GeoResult {
    /// Returns the coordinates when both halves are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }
}

/// The complete ordered output of one pipeline invocation.
///
/// Serializes as a bare JSON array of [`GeoResult`] records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineRun {
    results: Vec<GeoResult>,
}

impl PipelineRun {
    /// Wraps an already-ordered list of results.
    #[must_use]
    pub const fn new(results: Vec<GeoResult>) -> Self {
        Self { results }
    }

    /// A run with no records (source unavailable or board empty).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    /// Returns the records in board order.
    #[must_use]
    pub fn results(&self) -> &[GeoResult] {
        &self.results
    }

    /// Consumes the run, returning its records.
    #[must_use]
    pub fn into_results(self) -> Vec<GeoResult> {
        self.results
    }

    /// Number of records in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the run produced no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The run date, or `None` for an empty run.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.results.first().map(|r| r.date)
    }

    /// Number of records that resolved to a coordinate.
    #[must_use]
    pub fn located_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.coordinates().is_some())
            .count()
    }
}
