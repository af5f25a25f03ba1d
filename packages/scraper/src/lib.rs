#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Board scraping for the raid map.
//!
//! Split into two seams so the fragile, board-specific parts can be
//! swapped or mocked independently:
//!
//! - [`ContentSource`] fetches the raw markup of the board. The production
//!   implementation is [`firecrawl::FirecrawlSource`]; [`StaticSource`]
//!   serves fixed markup (saved pages, tests).
//! - [`EntryExtractor`] turns markup into [`RawEntry`] values in document
//!   order. [`selector::SelectorExtractor`] does this with a CSS selector.

pub mod firecrawl;
pub mod selector;

use async_trait::async_trait;
use raid_map_report_models::RawEntry;

/// Errors that can occur while fetching board markup.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The scraping service answered, but not with usable markup.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The source is missing required configuration (e.g. an API key).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Fetches the raw markup of a board page.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the HTML of the page at `url`.
    ///
    /// An empty string is a valid answer and means "no entries".
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the page could not be fetched.
    async fn fetch_markup(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Isolates the incident entries from a page of markup.
pub trait EntryExtractor: Send + Sync {
    /// Returns every entry found in `markup`, in document order.
    ///
    /// Returns an empty list for empty or unrelated markup.
    fn extract(&self, markup: &str) -> Vec<RawEntry>;
}

/// A [`ContentSource`] that always returns the same markup, regardless of
/// the requested URL.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    markup: String,
}

impl StaticSource {
    /// Creates a source that serves `markup`.
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch_markup(&self, _url: &str) -> Result<String, ScrapeError> {
        Ok(self.markup.clone())
    }
}
