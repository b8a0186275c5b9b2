use std::any::Any;
use std::ops::AddAssign;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::ScrapeError;
use crate::models::PageResult;
use crate::traits::{Fetcher, Parser};

/// Input queue shared by every worker of a pool.
///
/// Whoever holds the lock is the one waiting on `recv`, so each URL is
/// delivered to exactly one worker.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<String>>>;

/// Events emitted by a processor for monitoring/logging.
#[derive(Debug, Clone)]
pub enum ProcessorEvent<'a> {
    Started {
        worker_id: usize,
    },
    JobStarted {
        worker_id: usize,
        url: &'a str,
    },
    JobCompleted {
        worker_id: usize,
        url: &'a str,
        status_code: u16,
    },
    /// The server answered with an error status; no result is emitted.
    JobRejected {
        worker_id: usize,
        url: &'a str,
        status_code: u16,
        reason: &'a str,
    },
    JobFailed {
        worker_id: usize,
        url: &'a str,
        error: &'a ScrapeError,
    },
    Cancelled {
        worker_id: usize,
    },
    /// The result receiver was dropped.
    OutputClosed {
        worker_id: usize,
    },
    Stopped {
        worker_id: usize,
        stats: WorkerStats,
    },
}

/// Trait for receiving processor events (decoupled logging).
pub trait ProcessorReporter: Send + Sync {
    fn report(&self, event: ProcessorEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProcessorReporter for TracingReporter {
    fn report(&self, event: ProcessorEvent<'_>) {
        match event {
            ProcessorEvent::Started { worker_id } => {
                tracing::debug!(worker_id, "Worker started");
            }
            ProcessorEvent::JobStarted { worker_id, url } => {
                tracing::debug!(worker_id, %url, "Processing page");
            }
            ProcessorEvent::JobCompleted {
                worker_id,
                url,
                status_code,
            } => {
                tracing::info!(worker_id, %url, status_code, "Page scraped");
            }
            ProcessorEvent::JobRejected {
                worker_id,
                url,
                status_code,
                reason,
            } => {
                tracing::error!(worker_id, %url, status_code, error = %reason, "Processing error");
            }
            ProcessorEvent::JobFailed {
                worker_id,
                url,
                error,
            } => {
                tracing::error!(worker_id, %url, %error, "Processing error");
            }
            ProcessorEvent::Cancelled { worker_id } => {
                tracing::info!(worker_id, "Worker cancelled");
            }
            ProcessorEvent::OutputClosed { worker_id } => {
                tracing::warn!(worker_id, "Result receiver dropped, worker stopping");
            }
            ProcessorEvent::Stopped { worker_id, stats } => {
                tracing::debug!(
                    worker_id,
                    processed = stats.processed,
                    emitted = stats.emitted,
                    failed = stats.failed,
                    "Worker stopped"
                );
            }
        }
    }
}

/// Per-worker counters, summed by the pool once every worker has stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// URLs taken from the input queue.
    pub processed: u64,
    /// Results delivered to the output queue.
    pub emitted: u64,
    /// URLs dropped because of an error or an error status.
    pub failed: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.emitted += other.emitted;
        self.failed += other.failed;
    }
}

/// One worker of the pool: fetch, check status, parse, emit.
///
/// A failing URL is reported and skipped; nothing short of the input queue
/// closing (or cancellation) ends the loop.
pub struct Processor<F, P, R>
where
    F: Fetcher,
    P: Parser,
    R: ProcessorReporter,
{
    worker_id: usize,
    fetcher: F,
    parser: P,
    reporter: Arc<R>,
}

impl<F, P, R> Processor<F, P, R>
where
    F: Fetcher,
    P: Parser,
    R: ProcessorReporter,
{
    pub fn new(worker_id: usize, fetcher: F, parser: P, reporter: Arc<R>) -> Self {
        Self {
            worker_id,
            fetcher,
            parser,
            reporter,
        }
    }

    /// Consume URLs from `input` until it is closed and drained, sending one
    /// result per successful page to `output`.
    pub async fn run(
        &self,
        input: SharedReceiver,
        output: mpsc::Sender<PageResult>,
        cancel: CancellationToken,
    ) -> WorkerStats {
        let worker_id = self.worker_id;
        let mut stats = WorkerStats::default();
        self.reporter.report(ProcessorEvent::Started { worker_id });

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.reporter.report(ProcessorEvent::Cancelled { worker_id });
                    break;
                }
                next = next_url(&input) => next,
            };
            let Some(url) = next else {
                break;
            };

            stats.processed += 1;
            self.reporter.report(ProcessorEvent::JobStarted {
                worker_id,
                url: &url,
            });

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.reporter.report(ProcessorEvent::Cancelled { worker_id });
                    break;
                }
                outcome = self.process_guarded(&url) => outcome,
            };

            let result = match outcome {
                Ok(result) => result,
                Err(ScrapeError::Status {
                    status_code,
                    reason,
                }) => {
                    stats.failed += 1;
                    self.reporter.report(ProcessorEvent::JobRejected {
                        worker_id,
                        url: &url,
                        status_code,
                        reason: &reason,
                    });
                    continue;
                }
                Err(error) => {
                    stats.failed += 1;
                    self.reporter.report(ProcessorEvent::JobFailed {
                        worker_id,
                        url: &url,
                        error: &error,
                    });
                    continue;
                }
            };

            self.reporter.report(ProcessorEvent::JobCompleted {
                worker_id,
                url: &url,
                status_code: result.status_code,
            });

            let sent = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.reporter.report(ProcessorEvent::Cancelled { worker_id });
                    break;
                }
                sent = output.send(result) => sent,
            };
            if sent.is_err() {
                self.reporter.report(ProcessorEvent::OutputClosed { worker_id });
                break;
            }
            stats.emitted += 1;
        }

        self.reporter.report(ProcessorEvent::Stopped { worker_id, stats });
        stats
    }

    /// Run [`process`](Self::process), turning a panic into an error so the
    /// worker survives it.
    async fn process_guarded(&self, url: &str) -> Result<PageResult, ScrapeError> {
        match AssertUnwindSafe(self.process(url)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(ScrapeError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    /// Fetch, check the status, parse.
    pub async fn process(&self, url: &str) -> Result<PageResult, ScrapeError> {
        let page = self.fetcher.fetch(url).await?;
        if page.is_error_status() {
            return Err(ScrapeError::status(page.status_code));
        }

        let status_code = page.status_code;
        let info = self.parser.parse(page)?;
        Ok(PageResult::new(url, status_code, info))
    }
}

async fn next_url(input: &SharedReceiver) -> Option<String> {
    input.lock().await.recv().await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
