use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scout_core::config::{DEFAULT_TIMEOUT, ScraperConfig};
use scout_core::error::ScrapeError;
use scout_core::models::FetchedPage;
use scout_core::traits::Fetcher;

const USER_AGENT: &str = concat!("Scout/", env!("CARGO_PKG_VERSION"), " (page metadata scraper)");

/// HTTP fetcher using reqwest.
///
/// Performs exactly one GET per call; the retry policy lives in
/// [`RetryingFetcher`](scout_core::RetryingFetcher). The timeout covers the
/// whole attempt, body included, so no call can hang a worker indefinitely.
/// Clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Http(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::with_timeout(config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, e: reqwest::Error) -> ScrapeError {
        if e.is_timeout() {
            ScrapeError::Timeout(self.timeout)
        } else if e.is_connect() {
            ScrapeError::Network(format!("Connection failed: {e}"))
        } else {
            ScrapeError::Http(e.to_string())
        }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        // Error pages are never parsed, so their bodies are not downloaded.
        let body = if status_code >= 400 {
            Vec::new()
        } else {
            response
                .bytes()
                .await
                .map_err(|e| match self.map_error(e) {
                    ScrapeError::Http(msg) => {
                        ScrapeError::Http(format!("Failed to read response body: {msg}"))
                    }
                    other => other,
                })?
                .to_vec()
        };

        Ok(FetchedPage {
            url: url.to_string(),
            status_code,
            content_type,
            body,
        })
    }
}
