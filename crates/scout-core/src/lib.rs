pub mod config;
pub mod error;
pub mod models;
pub mod pool;
pub mod processor;
pub mod retry;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use config::{ScraperConfig, parse_duration};
pub use error::ScrapeError;
pub use models::{CSV_HEADER, FetchedPage, PageInfo, PageResult, ResultRow};
pub use pool::Pool;
pub use processor::{Processor, ProcessorEvent, ProcessorReporter, TracingReporter, WorkerStats};
pub use retry::RetryingFetcher;
pub use traits::{Fetcher, Parser};
