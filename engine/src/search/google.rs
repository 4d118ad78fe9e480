//! Google Programmable Search
//!
//! Queries the Custom Search JSON API. The API key and search engine id are
//! read from the environment variables named in `[search]`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchError, SearchProvider, Snippet};
use crate::config::SearchConfig;

pub struct GoogleSearch {
    base_url: String,
    api_key: String,
    engine_id: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

impl GoogleSearch {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            client: Client::new(),
        }
    }

    /// Build a provider from config, reading credentials from the environment
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SearchError::NotConfigured(format!("{} is not set", config.api_key_env))
        })?;
        let engine_id = std::env::var(&config.engine_id_env).map_err(|_| {
            SearchError::NotConfigured(format!("{} is not set", config.engine_id_env))
        })?;

        Ok(Self::new(config.base_url.clone(), api_key, engine_id))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Snippet>, SearchError> {
        let num = limit.clamp(1, 10).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            // The body may echo the key back; keep only the status.
            return Err(SearchError::Request(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let snippets: Vec<Snippet> = body
            .items
            .into_iter()
            .filter(|item| !item.snippet.trim().is_empty())
            .take(limit)
            .map(|item| Snippet {
                title: item.title,
                snippet: item.snippet,
                link: item.link,
            })
            .collect();

        tracing::debug!("Search for {:?} returned {} snippets", query, snippets.len());

        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_credentials() {
        let config = SearchConfig {
            api_key_env: "NUTRI_TEST_SEARCH_KEY_NEVER_SET".to_string(),
            ..SearchConfig::default()
        };

        assert!(matches!(
            GoogleSearch::from_config(&config),
            Err(SearchError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_response_without_items() {
        let body: SearchResponse = serde_json::from_str(r#"{"kind": "customsearch"}"#).unwrap();
        assert!(body.items.is_empty());
    }
}
