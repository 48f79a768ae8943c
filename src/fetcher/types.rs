//! Content fetcher types

use crate::error::{Result, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const KEYWORD_MAX_LEN: usize = 200;

/// Search form as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub keyword: String,
}

impl SearchForm {
    /// Trimmed keyword, or a validation error on `keyword`
    pub fn validate(&self) -> Result<String> {
        let keyword = self.keyword.trim();
        let mut errors = ValidationErrors::new();

        if keyword.is_empty() {
            errors.add("keyword", "This field is required.");
        } else {
            let len = keyword.chars().count();
            if len > KEYWORD_MAX_LEN {
                errors.add(
                    "keyword",
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        KEYWORD_MAX_LEN, len
                    ),
                );
            }
        }

        errors.into_result()?;
        Ok(keyword.to_string())
    }
}

/// Title and leading paragraphs extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub keyword: String,
    pub title: String,
    pub url: String,
    /// At most three excerpts, each longer than fifty characters
    pub paragraphs: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of a fetch that reached the upstream server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Upstream answered with a non-200 status
    Empty { url: String, status: u16 },
    Done(SearchResult),
}
