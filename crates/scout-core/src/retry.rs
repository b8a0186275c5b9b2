//! Bounded retry for pages that are temporarily unavailable.
//!
//! Wraps any single-attempt [`Fetcher`] and repeats the request while the
//! server answers `503 Service Unavailable`, up to a fixed number of attempts.
//!
//! Only 503 is retried. Transport errors (DNS, refused connection, timeout)
//! are returned immediately, and every other status is handed back to the
//! caller as-is. When the attempts run out while the server is still
//! unavailable, the last 503 page is returned rather than an error: the
//! caller decides what an error status means.
//!
//! # Example
//!
//! ```rust,no_run
//! use scout_core::retry::RetryingFetcher;
//! # use scout_core::traits::Fetcher;
//! # use scout_core::{FetchedPage, ScrapeError};
//! # #[derive(Clone)] struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<FetchedPage, ScrapeError> { todo!() }
//! # }
//! // At most 3 requests per URL.
//! let fetcher = RetryingFetcher::new(MyFetcher, 3);
//! ```

use crate::error::ScrapeError;
use crate::models::FetchedPage;
use crate::traits::Fetcher;

/// The only status that is considered transient.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// A [`Fetcher`] wrapper that retries on `503 Service Unavailable`.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    /// Total attempts, including the first one. Always at least 1.
    max_attempts: u32,
}

impl<F: Fetcher> RetryingFetcher<F> {
    /// Wrap `inner`, allowing at most `max_attempts` requests per URL.
    ///
    /// A value of 0 is treated as 1: every URL is fetched at least once.
    pub fn new(inner: F, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let mut attempt = 1;
        loop {
            let page = self.inner.fetch(url).await?;
            if page.status_code != SERVICE_UNAVAILABLE || attempt >= self.max_attempts {
                return Ok(page);
            }

            tracing::warn!(
                %url,
                attempt,
                max_attempts = self.max_attempts,
                "Page is temporarily unavailable, retrying"
            );
            attempt += 1;
        }
    }
}
