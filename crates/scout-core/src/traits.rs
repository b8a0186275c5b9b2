use std::future::Future;

use crate::error::ScrapeError;
use crate::models::{FetchedPage, PageInfo};

/// Performs a single HTTP GET for a URL.
///
/// Implementations must bound every call by a timeout: a fetch that never
/// returns would keep its worker, and therefore the whole pool, alive forever.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, ScrapeError>> + Send;
}

/// Extracts title and meta-description from a fetched page.
///
/// Takes the page by value: parsing consumes the body.
pub trait Parser: Send + Sync + Clone {
    fn parse(&self, page: FetchedPage) -> Result<PageInfo, ScrapeError>;
}
