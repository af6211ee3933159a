//! HTTP page fetching.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use reread_core::{defaults, Error, Result};

/// Configuration for the page fetcher.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Timeout applied to one page fetch, connection included.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(defaults::SCRAPE_TIMEOUT_SECS),
            user_agent: defaults::SCRAPE_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Create from environment variables.
    ///
    /// Reads `SCRAPE_TIMEOUT_SECS` and `SCRAPE_USER_AGENT`, falling back
    /// to the built-in defaults.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("SCRAPE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SCRAPE_TIMEOUT_SECS);
        let user_agent = std::env::var("SCRAPE_USER_AGENT")
            .unwrap_or_else(|_| defaults::SCRAPE_USER_AGENT.to_string());

        Self {
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
        }
    }
}

/// HTTP fetcher for bookmark pages.
///
/// Holds one reqwest client reused across fetches; timeout and User-Agent
/// are fixed at construction.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: &ScrapeConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch one page and return its body as text.
    ///
    /// Timeouts, transport failures, and non-2xx responses all come back
    /// as [`Error::Scrape`]; callers decide whether that is fatal or a
    /// soft miss.
    #[instrument(skip(self), fields(subsystem = "scrape", component = "fetcher", op = "fetch", url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Request failed for {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Page fetch returned non-success status");
            return Err(Error::Scrape(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Scrape(format!("Failed to read body from {}: {}", url, e)))?;

        debug!(body_len = body.len(), "Page fetched");
        Ok(body)
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new(&ScrapeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_shared_constants() {
        let config = ScrapeConfig::default();
        assert_eq!(
            config.timeout,
            Duration::from_secs(defaults::SCRAPE_TIMEOUT_SECS)
        );
        assert_eq!(config.user_agent, defaults::SCRAPE_USER_AGENT);
    }

    #[test]
    fn test_config_is_adjustable() {
        let config = ScrapeConfig {
            timeout: Duration::from_millis(250),
            ..ScrapeConfig::default()
        };
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.user_agent, defaults::SCRAPE_USER_AGENT);
    }
}
