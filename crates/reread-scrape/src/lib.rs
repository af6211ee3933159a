//! Page scraping for reread.
//!
//! Fetches bookmark pages over HTTP and extracts Open Graph / standard
//! meta fields from the returned HTML. Fetching and parsing are split so
//! the parser stays a pure function over an HTML string.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reread_scrape::{MetadataScraper, ScrapeConfig};
//!
//! let scraper = MetadataScraper::new(&ScrapeConfig::default());
//! let metadata = scraper.scrape("https://example.com/article").await?;
//! println!("title: {:?}", metadata.title);
//! ```

pub mod extract;
pub mod fetch;

pub use extract::extract_metadata;
pub use fetch::{PageFetcher, ScrapeConfig};

use reread_core::{PageMetadata, Result};

/// Fetches a page and extracts its metadata in one call.
#[derive(Clone, Default)]
pub struct MetadataScraper {
    fetcher: PageFetcher,
}

impl MetadataScraper {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            fetcher: PageFetcher::new(config),
        }
    }

    /// Create from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::new(&ScrapeConfig::from_env())
    }

    /// Fetch `url` and extract its metadata.
    ///
    /// Errors cover the fetch only; a page that parses to nothing is a
    /// successful scrape with every field `None`.
    pub async fn scrape(&self, url: &str) -> Result<PageMetadata> {
        let html = self.fetcher.fetch(url).await?;
        Ok(extract_metadata(&html))
    }
}
