//! Web Search Capability
//!
//! Used by the nutrition-fact responder to ground its answers. A provider
//! returns ranked snippets; an empty list is the "no results" signal.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod google;

pub use google::GoogleSearch;

/// Errors that can occur during a search call
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search not configured: {0}")]
    NotConfigured(String),

    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Unexpected search response: {0}")]
    Parse(String),
}

impl From<SearchError> for EngineError {
    fn from(err: SearchError) -> Self {
        EngineError::Search(err.to_string())
    }
}

/// One ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snippet {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Search provider trait
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns the name of the provider
    fn name(&self) -> &str;

    /// Return at most `limit` snippets for `query`, best first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Snippet>, SearchError>;
}

/// Run one search call bounded by `limit_time`. The call is never retried.
pub async fn search_with_timeout(
    provider: &dyn SearchProvider,
    query: &str,
    limit: usize,
    limit_time: Duration,
) -> Result<Vec<Snippet>, EngineError> {
    match tokio::time::timeout(limit_time, provider.search(query, limit)).await {
        Ok(Ok(snippets)) => Ok(snippets),
        Ok(Err(e)) => {
            tracing::warn!("Search provider {} failed: {}", provider.name(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::warn!(
                "Search provider {} timed out after {}s",
                provider.name(),
                limit_time.as_secs()
            );
            Err(EngineError::SearchTimeout)
        }
    }
}

/// Render snippets as a numbered source list for a generation prompt
pub fn format_snippets(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}\n{}\n({})", i + 1, s.title, s.snippet, s.link))
        .collect::<Vec<_>>()
        .join("\n\n")
}
