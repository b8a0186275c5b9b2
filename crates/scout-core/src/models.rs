use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Column names of the result table, in output order.
pub const CSV_HEADER: [&str; 5] = ["date", "url", "status_code", "title", "description"];

/// A fetched HTTP response, as handed from the fetcher to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status_code: u16,
    /// Raw `Content-Type` header value, if the server sent one.
    pub content_type: Option<String>,
    /// Response body. Left empty for error statuses (>= 400).
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn is_error_status(&self) -> bool {
        self.status_code >= 400
    }
}

/// Metadata extracted from a page's `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
}

/// One successfully scraped page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub status_code: u16,
    pub title: String,
    pub description: String,
}

impl PageResult {
    pub fn new(url: impl Into<String>, status_code: u16, info: PageInfo) -> Self {
        Self {
            url: url.into(),
            fetched_at: Utc::now(),
            status_code,
            title: info.title,
            description: info.description,
        }
    }

    /// Borrowed view of this result laid out as one output row.
    pub fn to_row(&self) -> ResultRow<'_> {
        ResultRow {
            date: self.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            url: &self.url,
            status_code: self.status_code,
            title: &self.title,
            description: &self.description,
        }
    }
}

/// Serializable row matching [`CSV_HEADER`].
#[derive(Debug, Serialize)]
pub struct ResultRow<'a> {
    /// RFC3339 timestamp of completion.
    pub date: String,
    pub url: &'a str,
    pub status_code: u16,
    pub title: &'a str,
    pub description: &'a str,
}
