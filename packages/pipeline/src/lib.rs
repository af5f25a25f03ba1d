#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end pipeline: board markup → geocoded report records.
//!
//! A run proceeds in stages, each finishing before the next starts:
//!
//! 1. Fetch the board markup from the [`ContentSource`]. Empty markup or
//!    a failed fetch produces an empty run.
//! 2. Extract entries and stamp the run date.
//! 3. Classify every entry (cheap, sequential).
//! 4. Forward-geocode every candidate with at most
//!    [`PipelineConfig::concurrency`] requests in flight.
//! 5. Reverse-resolve a city for entries that have coordinates but no
//!    city hint, with the same bound.
//! 6. Assemble one [`GeoResult`] per entry, in board order.
//!
//! Per-entry failures never abort the run; they are logged and surface as
//! absent fields on that entry's record.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt as _};
use raid_map_geocoder::arcgis::ArcGisGeocoder;
use raid_map_geocoder::resolve::{forward_geocode, reverse_resolve};
use raid_map_geocoder::{Geocoder, address, service_registry};
use raid_map_report_models::{AddressCandidate, Coordinates, GeoResult, PipelineRun, RawEntry};
use raid_map_scraper::firecrawl::{FirecrawlConfig, FirecrawlSource};
use raid_map_scraper::selector::SelectorExtractor;
use raid_map_scraper::{ContentSource, EntryExtractor, ScrapeError};

/// The People over Papers community board.
pub const DEFAULT_SOURCE_URL: &str =
    "https://padlet.com/PeopleoverPapers/people-over-papers-anonymous-anonimo-lf0l47ljszbto2uj";

/// Default number of geocoding requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Errors that can occur while assembling a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No enabled geocoding service is configured.
    #[error("No enabled geocoding service")]
    NoGeocoder,
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Board page to scrape.
    pub source_url: String,
    /// Maximum number of geocoding requests in flight at once.
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Reads `RAID_MAP_SOURCE_URL` from the environment, falling back to
    /// [`DEFAULT_SOURCE_URL`].
    #[must_use]
    pub fn from_env() -> Self {
        let source_url = std::env::var("RAID_MAP_SOURCE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        Self {
            source_url,
            ..Self::default()
        }
    }

    /// Overrides the concurrency limit (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// The extraction and geocoding pipeline.
///
/// Holds no state between runs; every [`Pipeline::run`] recomputes the
/// full dataset.
pub struct Pipeline {
    source: Arc<dyn ContentSource>,
    extractor: Arc<dyn EntryExtractor>,
    geocoder: Arc<dyn Geocoder>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn ContentSource>,
        extractor: Arc<dyn EntryExtractor>,
        geocoder: Arc<dyn Geocoder>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            geocoder,
            config,
        }
    }

    /// Wires the production collaborators: Firecrawl for the board, the
    /// board CSS selector for extraction, and the default geocoding
    /// service from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoGeocoder`] if no geocoding service is
    /// enabled.
    pub fn production(
        client: &reqwest::Client,
        firecrawl: FirecrawlConfig,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if firecrawl.api_key.is_none() {
            log::warn!("FIRECRAWL_API is not set; runs will produce empty datasets");
        }

        let source = Arc::new(FirecrawlSource::new(client.clone(), firecrawl));
        Self::with_registry_geocoder(client, source, config)
    }

    /// Wires `source` to the board CSS selector and the default geocoding
    /// service from the registry.
    ///
    /// The configured concurrency is capped by the service's own limit.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoGeocoder`] if no geocoding service is
    /// enabled.
    pub fn with_registry_geocoder(
        client: &reqwest::Client,
        source: Arc<dyn ContentSource>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let service = service_registry::default_service().ok_or(PipelineError::NoGeocoder)?;
        let geocoder = ArcGisGeocoder::from_service(client.clone(), &service)
            .ok_or(PipelineError::NoGeocoder)?;
        log::info!("Using geocoding service '{}'", service.name);

        let concurrency = config.concurrency.min(service.concurrent_requests());

        Ok(Self::new(
            source,
            Arc::new(SelectorExtractor::board()),
            Arc::new(geocoder),
            config.with_concurrency(concurrency),
        ))
    }

    /// Returns the pipeline settings.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline against the configured board.
    ///
    /// Always returns a complete run. A board that cannot be fetched
    /// yields an empty run.
    pub async fn run(&self) -> PipelineRun {
        match self.try_run().await {
            Ok(run) => run,
            Err(e) => {
                log::warn!("Failed to fetch board markup: {e}");
                PipelineRun::empty()
            }
        }
    }

    /// Runs the full pipeline, reporting a failed fetch instead of
    /// folding it into an empty run.
    ///
    /// # Errors
    ///
    /// Returns the [`ScrapeError`] if the board markup cannot be fetched.
    /// A board that is reachable but empty is an `Ok` empty run.
    pub async fn try_run(&self) -> Result<PipelineRun, ScrapeError> {
        let start = Instant::now();

        let markup = self.source.fetch_markup(&self.config.source_url).await?;

        if markup.trim().is_empty() {
            log::warn!("Board returned no markup; producing an empty run");
            return Ok(PipelineRun::empty());
        }

        let entries = self.extractor.extract(&markup);
        let date = chrono::Local::now().date_naive();

        log::info!("Processing {} board entries...", entries.len());
        let run = self.process(&entries, date).await;

        log::info!(
            "Pipeline run complete: {} entries, {} located, took {:.1}s",
            run.len(),
            run.located_count(),
            start.elapsed().as_secs_f64()
        );

        Ok(run)
    }

    /// Classifies, geocodes, and reverse-resolves already extracted
    /// entries, stamping every record with `date`.
    pub async fn process(&self, entries: &[RawEntry], date: NaiveDate) -> PipelineRun {
        let candidates: Vec<Option<AddressCandidate>> = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| match address::classify(entry.as_str()) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    log::warn!("Entry {idx}: {e}");
                    None
                }
            })
            .collect();

        let coordinates = self.geocode_all(&candidates).await;
        let cities = self.resolve_cities(&candidates, &coordinates).await;

        let results = coordinates
            .into_iter()
            .zip(cities)
            .enumerate()
            .map(|(id, (coords, city))| GeoResult {
                id,
                lat: coords.map(|c| c.lat),
                lon: coords.map(|c| c.lon),
                city,
                date,
            })
            .collect();

        PipelineRun::new(results)
    }

    /// Forward-geocodes every classified candidate.
    async fn geocode_all(&self, candidates: &[Option<AddressCandidate>]) -> Vec<Option<Coordinates>> {
        let geocoder = self.geocoder.as_ref();

        let tasks = candidates
            .iter()
            .enumerate()
            .filter_map(|(idx, candidate)| candidate.as_ref().map(|c| (idx, c)))
            .map(|(idx, candidate)| async move {
                match forward_geocode(geocoder, candidate).await {
                    Ok(coords) => (idx, Some(coords)),
                    Err(e) => {
                        log::warn!("Entry {idx}: geocoding failed: {e}");
                        (idx, None)
                    }
                }
            });

        collect_indexed(candidates.len(), self.config.concurrency, tasks).await
    }

    /// Picks each entry's city: the classifier's hint when it has one,
    /// otherwise a reverse lookup for entries that resolved to
    /// coordinates.
    async fn resolve_cities(
        &self,
        candidates: &[Option<AddressCandidate>],
        coordinates: &[Option<Coordinates>],
    ) -> Vec<Option<String>> {
        let geocoder = self.geocoder.as_ref();

        let tasks = candidates
            .iter()
            .zip(coordinates)
            .enumerate()
            .filter_map(|(idx, (candidate, coords))| {
                let hint = candidate.as_ref().and_then(AddressCandidate::city_hint);
                match (hint, coords) {
                    (None, Some(coords)) => Some((idx, *coords)),
                    _ => None,
                }
            })
            .map(|(idx, coords)| async move {
                match reverse_resolve(geocoder, coords).await {
                    Ok(city) => (idx, Some(city)),
                    Err(e) => {
                        log::warn!("Entry {idx}: reverse geocoding failed: {e}");
                        (idx, None)
                    }
                }
            });

        let mut cities = collect_indexed(candidates.len(), self.config.concurrency, tasks).await;

        for (city, candidate) in cities.iter_mut().zip(candidates) {
            if let Some(hint) = candidate.as_ref().and_then(AddressCandidate::city_hint) {
                *city = Some(hint.to_string());
            }
        }

        cities
    }
}

/// Runs `tasks` with at most `concurrency` in flight, placing each output
/// at the index it reports. Slots without a task stay `None`.
async fn collect_indexed<R, Fut>(
    len: usize,
    concurrency: usize,
    tasks: impl Iterator<Item = Fut>,
) -> Vec<Option<R>>
where
    Fut: Future<Output = (usize, Option<R>)>,
{
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(len).collect();

    let mut completed = stream::iter(tasks).buffer_unordered(concurrency.max(1));
    while let Some((idx, value)) = completed.next().await {
        if let Some(slot) = slots.get_mut(idx) {
            *slot = value;
        }
    }

    slots
}
