//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, so clones handed
//! to pool workers share state with the copy the test asserts on.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::error::ScrapeError;
use crate::models::{FetchedPage, PageInfo};
use crate::processor::{ProcessorEvent, ProcessorReporter};
use crate::traits::{Fetcher, Parser};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

type Scripted = Result<(u16, String), ScrapeError>;

/// Mock fetcher with scripted responses per URL.
///
/// Each call pops the next scripted response for the URL; the last one is
/// sticky and repeats forever. URLs without a script fail with a network
/// error.
#[derive(Clone, Default)]
pub struct MockFetcher {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an HTML response with the given status.
    pub fn page(self, url: &str, status_code: u16, html: &str) -> Self {
        self.push(url, Ok((status_code, html.to_string())));
        self
    }

    /// Append a terminal error.
    pub fn error(self, url: &str, error: ScrapeError) -> Self {
        self.push(url, Err(error));
        self
    }

    /// Sleep this long before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn push(&self, url: &str, response: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    fn next_response(&self, url: &str) -> Scripted {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ScrapeError::Network(format!("no route to {url}"))),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (status_code, html) = self.next_response(url)?;
        Ok(FetchedPage {
            url: url.to_string(),
            status_code,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: if status_code >= 400 {
                Vec::new()
            } else {
                html.into_bytes()
            },
        })
    }
}

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Mock parser: the body becomes the title, the URL the description.
#[derive(Clone, Default)]
pub struct MockParser {
    fail_on: Vec<String>,
    panic_on: Vec<String>,
}

impl MockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a parse error for this URL.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.fail_on.push(url.to_string());
        self
    }

    /// Panic while parsing this URL.
    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on.push(url.to_string());
        self
    }
}

impl Parser for MockParser {
    fn parse(&self, page: FetchedPage) -> Result<PageInfo, ScrapeError> {
        if self.panic_on.contains(&page.url) {
            panic!("mock parser blew up on {}", page.url);
        }
        if self.fail_on.contains(&page.url) {
            return Err(ScrapeError::Parse("mock parse failure".into()));
        }
        Ok(PageInfo {
            title: String::from_utf8_lossy(&page.body).into_owned(),
            description: page.url,
        })
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock processor reporter that records events as `Label` or `Label:url`.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.split(':').next() == Some(label))
            .count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == event)
    }
}

impl ProcessorReporter for MockReporter {
    fn report(&self, event: ProcessorEvent<'_>) {
        let label = match &event {
            ProcessorEvent::Started { .. } => "Started".to_string(),
            ProcessorEvent::JobStarted { url, .. } => format!("JobStarted:{url}"),
            ProcessorEvent::JobCompleted { url, .. } => format!("JobCompleted:{url}"),
            ProcessorEvent::JobRejected { url, .. } => format!("JobRejected:{url}"),
            ProcessorEvent::JobFailed { url, .. } => format!("JobFailed:{url}"),
            ProcessorEvent::Cancelled { .. } => "Cancelled".to_string(),
            ProcessorEvent::OutputClosed { .. } => "OutputClosed".to_string(),
            ProcessorEvent::Stopped { .. } => "Stopped".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ---------------------------------------------------------------------------
// CapturedLogs
// ---------------------------------------------------------------------------

/// Tracing layer that records the level and message of every event.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedLogs {
    /// Route this thread's events into a fresh capture until the guard drops.
    ///
    /// Only reliable on the current-thread runtime.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let subscriber = tracing_subscriber::registry().with(logs.clone());
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageVisitor::default();
        event.record(&mut message);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), message.0));
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
