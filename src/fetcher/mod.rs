//! Content fetcher: keyword page scrape plus optional email digest
//!
//! One pass, no retries. A keyword becomes a page URL; a 200 response is
//! parsed for the page heading and the leading paragraphs of the main
//! content container.

pub mod handler;
pub mod types;

pub use handler::{fetcher_router, FetcherState};
pub use types::{FetchOutcome, SearchForm, SearchResult};

use crate::accounts::Account;
use crate::config::FetcherConfig;
use crate::error::{Error, NotifyError, Result};
use crate::notifier::Notifier;
use chrono::Utc;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;

/// Title used when the page has no heading
pub const TITLE_FALLBACK: &str = "not found";

/// Paragraph candidates considered, in document order
const CANDIDATE_LIMIT: usize = 5;
/// Excerpts must be longer than this many characters
const MIN_PARAGRAPH_LEN: usize = 50;
const MAX_PARAGRAPHS: usize = 3;

/// Fetches keyword pages and extracts a bounded summary
pub struct Fetcher {
    client: reqwest::Client,
    base_url: Url,
    title_selector: Selector,
    container_selector: Selector,
    paragraph_selector: Selector,
}

impl Fetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!(
                "Invalid fetcher base_url '{}': {}",
                config.base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Fetcher base_url '{}' cannot take a page path",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            title_selector: selector("h1.firstHeading")?,
            container_selector: selector("div.mw-parser-output")?,
            paragraph_selector: selector("p")?,
        })
    }

    /// Page URL for a keyword; spaces become underscores and the result is
    /// percent-encoded as a single path segment
    pub fn page_url(&self, keyword: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&keyword.replace(' ', "_"));
        }
        url.to_string()
    }

    /// Fetch and extract; transport and body errors are `FetchFailure`
    pub async fn fetch(&self, keyword: &str) -> Result<FetchOutcome> {
        let url = self.page_url(keyword);
        tracing::debug!(keyword, url = %url, "Fetching page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::FetchFailure(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::info!(keyword, status = status.as_u16(), "No page for keyword");
            return Ok(FetchOutcome::Empty {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::FetchFailure(e.to_string()))?;

        let result = self.extract(&body, keyword, &url);
        tracing::info!(
            keyword,
            paragraphs = result.paragraphs.len(),
            "Fetched page"
        );
        Ok(FetchOutcome::Done(result))
    }

    /// Pull the title and up to three long paragraphs out of a page
    pub fn extract(&self, html: &str, keyword: &str, url: &str) -> SearchResult {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title_selector)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| TITLE_FALLBACK.to_string());

        let paragraphs = match document.select(&self.container_selector).next() {
            Some(container) => container
                .select(&self.paragraph_selector)
                .map(|p| p.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
                .take(CANDIDATE_LIMIT)
                .filter(|text| text.chars().count() > MIN_PARAGRAPH_LEN)
                .take(MAX_PARAGRAPHS)
                .collect(),
            None => Vec::new(),
        };

        SearchResult {
            keyword: keyword.to_string(),
            title,
            url: url.to_string(),
            paragraphs,
            fetched_at: Utc::now(),
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Internal(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Plain-text digest of a search result
pub fn digest(result: &SearchResult) -> String {
    let mut out = format!(
        "Search results for: {}\n\nTitle: {}\nURL: {}\n\nContent found:\n{}\n",
        result.keyword,
        result.title,
        result.url,
        "-".repeat(50)
    );
    for (i, paragraph) in result.paragraphs.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, paragraph));
    }
    out
}

/// Mail the digest to the acting owner; returns the recipient
pub async fn notify(
    notifier: &Notifier,
    owner: &Account,
    result: &SearchResult,
) -> std::result::Result<String, NotifyError> {
    let subject = format!("Search results: {}", result.keyword);
    notifier
        .send(owner.email.as_deref(), &subject, &digest(result), None)
        .await?;
    Ok(owner.email.clone().unwrap_or_default())
}
