//! CSS-selector entry extraction.
//!
//! The board renders each report's location line in an element carrying a
//! fixed set of utility classes. Every matching element becomes one
//! [`RawEntry`], with its text content stripped the same way the board
//! displays it.

use std::sync::LazyLock;

use raid_map_report_models::RawEntry;
use scraper::{ElementRef, Html, Selector};

use crate::{EntryExtractor, ScrapeError};

/// Compound class selector for the board's entry-location widget.
pub const BOARD_ENTRY_SELECTOR: &str = ".text-body-small.line-clamp-1.break-word-anywhere.whitespace-break-spaces.text-dark-text-100";

static BOARD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(BOARD_ENTRY_SELECTOR).expect("valid CSS selector"));

/// Extracts entries from every element matching a CSS selector.
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    selector: Selector,
}

impl SelectorExtractor {
    /// Creates an extractor for an arbitrary CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if the selector is invalid.
    pub fn new(selector: &str) -> Result<Self, ScrapeError> {
        let selector = Selector::parse(selector)
            .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))?;
        Ok(Self { selector })
    }

    /// Creates an extractor for the board's entry-location widget.
    #[must_use]
    pub fn board() -> Self {
        Self {
            selector: BOARD_SELECTOR.clone(),
        }
    }
}

impl Default for SelectorExtractor {
    fn default() -> Self {
        Self::board()
    }
}

impl EntryExtractor for SelectorExtractor {
    fn extract(&self, markup: &str) -> Vec<RawEntry> {
        if markup.trim().is_empty() {
            return Vec::new();
        }

        let document = Html::parse_document(markup);
        let entries: Vec<RawEntry> = document
            .select(&self.selector)
            .map(stripped_text)
            .filter(|text| !text.is_empty())
            .map(RawEntry::from)
            .collect();

        log::debug!("Extracted {} entries from markup", entries.len());
        entries
    }
}

/// Joins the element's text nodes, trimming each one individually.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}
