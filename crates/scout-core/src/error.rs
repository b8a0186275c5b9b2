use std::time::Duration;

use thiserror::Error;

/// Error types for the Scout scraping pipeline.
#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    /// HTTP request could not be built or completed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A single fetch attempt exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Network/connection error (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error status (>= 400).
    #[error("HTTP {status_code}: {reason}")]
    Status { status_code: u16, reason: String },

    /// The response body could not be decoded into text.
    #[error("Charset decoding error: {0}")]
    Decode(String),

    /// The document could not be read as HTML.
    #[error("Document parse error: {0}")]
    Parse(String),

    /// Invalid configuration, only raised at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Processing a single URL panicked.
    #[error("Processing panicked: {0}")]
    Panicked(String),
}

impl ScrapeError {
    /// Returns true for failures of the transport rather than the content.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_) | ScrapeError::Timeout(_) | ScrapeError::Network(_)
        )
    }

    /// Builds a `Status` error from a numeric code, using the canonical reason phrase.
    pub fn status(status_code: u16) -> Self {
        ScrapeError::Status {
            status_code,
            reason: canonical_reason(status_code).to_string(),
        }
    }
}

fn canonical_reason(status_code: u16) -> &'static str {
    match status_code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        410 => "Gone",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Unexpected Status",
    }
}
