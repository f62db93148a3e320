//! Web Search Port - Augments assistant answers with live search results.
//!
//! The contract is string-in, JSON-string-out: a successful search yields the
//! provider payload verbatim, and HTTP or transport failures yield an error
//! envelope (see [`search_error_envelope`]) instead of an `Err`. The only
//! `Err` is a missing credential, which is detected before any request.

use async_trait::async_trait;
use serde::Serialize;

/// Port for web search providers.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Runs a search and returns a JSON string.
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

/// Web search precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("TAVILY_API_KEY is not set")]
    MissingApiKey,
}

/// Fixed request parameters sent with every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParameters {
    pub search_depth: SearchDepth,
    pub max_results: u32,
    pub include_answers: bool,
    pub include_raw_content: bool,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            search_depth: SearchDepth::Advanced,
            max_results: 5,
            include_answers: true,
            include_raw_content: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

/// JSON error envelope `{"error": ..., "details": ...}` returned on failure.
pub fn search_error_envelope(error: impl Into<String>, details: impl Into<String>) -> String {
    serde_json::json!({
        "error": error.into(),
        "details": details.into(),
    })
    .to_string()
}
