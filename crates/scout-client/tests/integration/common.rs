use std::sync::{Arc, Mutex};
use std::time::Duration;

use scout_client::{HtmlParser, ReqwestFetcher};
use scout_core::{Pool, ProcessorEvent, ProcessorReporter, ScraperConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type TestPool = Pool<ReqwestFetcher, HtmlParser, RecordingReporter>;

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("scout=debug")
        .with_test_writer()
        .try_init();
}

pub fn html(title: &str, description: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>{title}</title><meta name="description" content="{description}"></head><body><p>{title}</p></body></html>"#
    )
}

pub fn html_response(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.into(), "text/html; charset=utf-8")
}

/// Serve a 200 page with the given title and description at `route`.
pub async fn mount_page(server: &MockServer, route: &str, title: &str, description: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_response(200, html(title, description)))
        .mount(server)
        .await;
}

pub fn config(workers: usize, retries: u32) -> ScraperConfig {
    ScraperConfig::default()
        .with_worker_count(workers)
        .with_retry_count(retries)
        .with_timeout(Duration::from_secs(2))
}

/// Build a pool backed by real HTTP and a recording reporter.
pub fn setup_pool(config: ScraperConfig) -> (TestPool, RecordingReporter) {
    init_tracing();
    let fetcher = ReqwestFetcher::from_config(&config).unwrap();
    let parser = HtmlParser::new().unwrap();
    let reporter = RecordingReporter::default();
    let pool = Pool::with_reporter(config, fetcher, parser, reporter.clone()).unwrap();
    (pool, reporter)
}

/// Reporter that keeps the kind of every event, plus the url when there is one.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
}

impl RecordingReporter {
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn urls(&self, kind: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .filter_map(|(_, url)| url.clone())
            .collect()
    }
}

impl ProcessorReporter for RecordingReporter {
    fn report(&self, event: ProcessorEvent<'_>) {
        let entry = match event {
            ProcessorEvent::Started { .. } => ("started", None),
            ProcessorEvent::JobStarted { url, .. } => ("job_started", Some(url.to_string())),
            ProcessorEvent::JobCompleted { url, .. } => ("job_completed", Some(url.to_string())),
            ProcessorEvent::JobRejected { url, .. } => ("job_rejected", Some(url.to_string())),
            ProcessorEvent::JobFailed { url, .. } => ("job_failed", Some(url.to_string())),
            ProcessorEvent::Cancelled { .. } => ("cancelled", None),
            ProcessorEvent::OutputClosed { .. } => ("output_closed", None),
            ProcessorEvent::Stopped { .. } => ("stopped", None),
        };
        self.events.lock().unwrap().push(entry);
    }
}
