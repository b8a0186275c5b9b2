use scraper::{Html, Selector};
use scout_core::error::ScrapeError;
use scout_core::models::{FetchedPage, PageInfo};
use scout_core::traits::Parser;

use crate::decode::decode_html;

const TITLE_SELECTOR: &str = "head title";
const DESCRIPTION_SELECTOR: &str = r#"head meta[name="description"]"#;

/// Extracts the title and meta description from an HTML page.
///
/// The body is decoded to UTF-8 first (see [`decode_html`]). HTML parsing
/// itself never fails: html5ever recovers from any markup, and absent
/// elements leave the corresponding field empty.
#[derive(Clone)]
pub struct HtmlParser {
    title: Selector,
    description: Selector,
}

impl HtmlParser {
    pub fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            title: selector(TITLE_SELECTOR)?,
            description: selector(DESCRIPTION_SELECTOR)?,
        })
    }

    /// Extract page info from an already decoded document.
    pub fn extract(&self, html: &str) -> PageInfo {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();

        let description = document
            .select(&self.description)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(str::to_string)
            .unwrap_or_default();

        PageInfo { title, description }
    }
}

impl Parser for HtmlParser {
    fn parse(&self, page: FetchedPage) -> Result<PageInfo, ScrapeError> {
        let decoded = decode_html(&page.body, page.content_type.as_deref())?;
        tracing::trace!(url = %page.url, encoding = decoded.encoding, "Decoded page body");
        Ok(self.extract(&decoded.html))
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("invalid selector '{css}': {e}")))
}
