//! Firecrawl scraping API client.
//!
//! The board is a client-rendered page, so a plain `GET` returns an empty
//! shell. Firecrawl renders the page server-side and hands back the final
//! HTML.
//!
//! See <https://docs.firecrawl.dev/api-reference/endpoint/scrape>

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::{ContentSource, ScrapeError};

/// Default Firecrawl API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Rendering a large board can take a while.
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for the Firecrawl API.
#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    /// API base URL (without a trailing slash).
    pub base_url: String,
    /// Bearer token. `None` disables the source.
    pub api_key: Option<String>,
}

impl FirecrawlConfig {
    /// Reads `FIRECRAWL_API` (key) and `FIRECRAWL_URL` (base URL) from the
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("FIRECRAWL_API")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let base_url = std::env::var("FIRECRAWL_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

/// [`ContentSource`] backed by the Firecrawl `/v1/scrape` endpoint.
#[derive(Debug, Clone)]
pub struct FirecrawlSource {
    client: reqwest::Client,
    config: FirecrawlConfig,
}

impl FirecrawlSource {
    /// Creates a source using the given HTTP client and settings.
    #[must_use]
    pub const fn new(client: reqwest::Client, config: FirecrawlConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ContentSource for FirecrawlSource {
    async fn fetch_markup(&self, url: &str) -> Result<String, ScrapeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ScrapeError::Config("FIRECRAWL_API is not set".to_string()))?;

        log::info!("Scraping {url} via Firecrawl...");

        let resp = self
            .client
            .post(format!("{}/v1/scrape", self.config.base_url))
            .bearer_auth(api_key)
            .timeout(SCRAPE_TIMEOUT)
            .json(&ScrapeRequest {
                url,
                formats: ["html"],
            })
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Pulls the rendered HTML out of a scrape response.
///
/// A successful response without an `html` field yields an empty string.
fn parse_response(body: &serde_json::Value) -> Result<String, ScrapeError> {
    if body.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        let message = body
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown error");
        return Err(ScrapeError::Parse(format!("Firecrawl scrape failed: {message}")));
    }

    let data = body
        .get("data")
        .ok_or_else(|| ScrapeError::Parse("Firecrawl response missing 'data'".to_string()))?;

    Ok(data
        .get("html")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string())
}
