mod input;
mod output;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use scout_client::{HtmlParser, ReqwestFetcher};
use scout_core::config::{DEFAULT_RETRY_COUNT, DEFAULT_WORKER_COUNT, parse_duration};
use scout_core::{Pool, ScraperConfig};

use crate::output::CsvSink;

#[derive(Parser, Debug)]
#[command(
    name = "scout",
    version,
    about = "Concurrent page title and meta-description scraper"
)]
struct Cli {
    /// URLs to scrape (read from stdin, one per line, when omitted)
    urls: Vec<String>,

    /// CSV file to write results to
    #[arg(short, long, env = "OUTPUT", default_value = "data.csv")]
    output: PathBuf,

    /// Number of concurrent workers
    #[arg(long = "threads", env = "THREAD_COUNT", default_value_t = DEFAULT_WORKER_COUNT)]
    worker_count: usize,

    /// Per-attempt request timeout (e.g. "500ms", "5s", "1m")
    #[arg(long, env = "TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    timeout: Duration,

    /// Total attempts per URL while the server answers 503
    #[arg(long = "retries", env = "RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    retry_count: u32,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig::default()
            .with_worker_count(self.worker_count)
            .with_timeout(self.timeout)
            .with_retry_count(self.retry_count)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = cli.scraper_config();
    config.validate().context("Invalid configuration")?;
    tracing::info!(%config, "Starting scraper");

    let urls = if cli.urls.is_empty() {
        input::read_urls(std::io::stdin().lock()).context("Failed to read URLs from stdin")?
    } else {
        cli.urls
    };
    let submitted = urls.len();

    let fetcher = ReqwestFetcher::from_config(&config).context("Failed to create HTTP client")?;
    let parser = HtmlParser::new()?;
    let pool = Pool::new(config, fetcher, parser)?;

    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create output file: {}", cli.output.display()))?;
    let mut sink = CsvSink::new(BufWriter::new(file)).context("Failed to write CSV header")?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let (input_tx, input_rx) = mpsc::channel(pool.config().worker_count);
    let mut results = pool.run(input_rx, cancel.clone());

    let producer = tokio::spawn(async move {
        for url in urls {
            // Closed once every worker has stopped.
            if input_tx.send(url).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = results.recv().await {
        sink.write(&result)
            .with_context(|| format!("Failed to write result for {}", result.url))?;
    }
    let written = sink.finish().context("Failed to flush output file")?;
    producer.await.context("URL producer task failed")?;

    if cancel.is_cancelled() {
        tracing::warn!(written, submitted, "Scrape interrupted");
    } else {
        tracing::info!(
            written,
            submitted,
            output = %cli.output.display(),
            "Scrape finished"
        );
    }

    Ok(())
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("scout=info"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
