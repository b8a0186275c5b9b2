use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::PageResult;
use crate::processor::{Processor, ProcessorReporter, TracingReporter, WorkerStats};
use crate::retry::RetryingFetcher;
use crate::traits::{Fetcher, Parser};

/// Capacity of the result channel. Tokio has no rendezvous channel, so a
/// single slot is the closest match: a worker waits as soon as the sink
/// falls one result behind.
pub const OUTPUT_CAPACITY: usize = 1;

/// Fixed-size worker pool: N processors sharing one input and one output queue.
///
/// Generic over the fetcher, parser and reporter so it can be driven without
/// real HTTP in tests.
pub struct Pool<F, P, R = TracingReporter>
where
    F: Fetcher,
    P: Parser,
    R: ProcessorReporter,
{
    config: ScraperConfig,
    fetcher: RetryingFetcher<F>,
    parser: P,
    reporter: Arc<R>,
}

impl<F, P> Pool<F, P, TracingReporter>
where
    F: Fetcher + 'static,
    P: Parser + 'static,
{
    /// Create a pool that logs through `tracing`.
    pub fn new(config: ScraperConfig, fetcher: F, parser: P) -> Result<Self, ScrapeError> {
        Self::with_reporter(config, fetcher, parser, TracingReporter)
    }
}

impl<F, P, R> Pool<F, P, R>
where
    F: Fetcher + 'static,
    P: Parser + 'static,
    R: ProcessorReporter + 'static,
{
    /// Create a pool with a custom reporter.
    ///
    /// `fetcher` performs single attempts; the pool wraps it with the
    /// configured 503 retry policy.
    pub fn with_reporter(
        config: ScraperConfig,
        fetcher: F,
        parser: P,
        reporter: R,
    ) -> Result<Self, ScrapeError> {
        config.validate()?;
        let fetcher = RetryingFetcher::new(fetcher, config.retry_count);
        Ok(Self {
            config,
            fetcher,
            parser,
            reporter: Arc::new(reporter),
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Start the workers and return the result queue.
    ///
    /// The returned receiver yields results in completion order and is
    /// closed once every worker has stopped, which happens when `input` is
    /// closed and drained or `cancel` fires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(
        &self,
        input: mpsc::Receiver<String>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<PageResult> {
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CAPACITY);
        let input = Arc::new(Mutex::new(input));
        let worker_count = self.config.worker_count;

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let processor = Processor::new(
                worker_id,
                self.fetcher.clone(),
                self.parser.clone(),
                Arc::clone(&self.reporter),
            );
            let input = Arc::clone(&input);
            let output = output_tx.clone();
            let cancel = cancel.clone();
            workers.spawn(async move { processor.run(input, output, cancel).await });
        }

        tokio::spawn(async move {
            let mut totals = WorkerStats::default();
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(stats) => totals += stats,
                    Err(e) => tracing::error!(error = %e, "Worker task ended abnormally"),
                }
            }

            // Last sender: dropping it closes the output queue.
            drop(output_tx);
            tracing::info!(
                workers = worker_count,
                processed = totals.processed,
                emitted = totals.emitted,
                failed = totals.failed,
                "All workers finished"
            );
        });

        output_rx
    }

    /// Feed `urls` through the pool and collect every result.
    pub async fn scrape_all(&self, urls: Vec<String>) -> Vec<PageResult> {
        let (input_tx, input_rx) = mpsc::channel(self.config.worker_count);
        let mut output = self.run(input_rx, CancellationToken::new());

        let producer = tokio::spawn(async move {
            for url in urls {
                if input_tx.send(url).await.is_err() {
                    break;
                }
            }
        });

        let mut results = Vec::new();
        while let Some(result) = output.recv().await {
            results.push(result);
        }
        if let Err(e) = producer.await {
            tracing::error!(error = %e, "URL producer ended abnormally");
        }
        results
    }
}
