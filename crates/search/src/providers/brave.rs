//! Brave Search web provider.

use super::{http_client, map_transport_error, opt_str, read_json};
use async_trait::async_trait;
use hottake_core::error::SearchError;
use hottake_core::search::{RawSearchResult, SearchProvider, SourceKind};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com";
/// Brave's free tier caps `count` at 20.
const MAX_COUNT: usize = 20;

pub struct BraveSearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: http_client(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchResult>, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::NotConfigured("brave".into()));
        }

        let count = limit.clamp(1, MAX_COUNT).to_string();
        debug!(provider = "brave", count = %count, "Searching");

        let response = self
            .client
            .get(format!("{}/res/v1/web/search", self.base_url))
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = read_json("brave", response).await?;
        Ok(parse_response(&body))
    }
}

fn parse_response(body: &serde_json::Value) -> Vec<RawSearchResult> {
    body["web"]["results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| RawSearchResult {
                    title: opt_str(item, "title").unwrap_or_default(),
                    url: opt_str(item, "url").unwrap_or_default(),
                    snippet: opt_str(item, "description"),
                    publisher: opt_str(&item["profile"], "name"),
                    published: opt_str(item, "page_age").or_else(|| opt_str(item, "age")),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_web_results() {
        let body = serde_json::json!({
            "web": {
                "results": [
                    {
                        "title": "Pizza debate",
                        "url": "https://www.example.com/pizza",
                        "description": "Is pineapple acceptable?",
                        "age": "2 days ago",
                        "profile": {"name": "Example"}
                    },
                    {
                        "title": "Second",
                        "url": "https://other.org/",
                        "page_age": "2025-03-01T10:00:00"
                    }
                ]
            }
        });
        let results = parse_response(&body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet.as_deref(), Some("Is pineapple acceptable?"));
        assert_eq!(results[0].publisher.as_deref(), Some("Example"));
        assert_eq!(results[0].published.as_deref(), Some("2 days ago"));
        assert_eq!(results[1].published.as_deref(), Some("2025-03-01T10:00:00"));
        assert!(results[1].snippet.is_none());
    }

    #[test]
    fn missing_results_is_empty() {
        assert!(parse_response(&serde_json::json!({"query": {}})).is_empty());
    }

    #[tokio::test]
    async fn unconfigured_search_fails_without_network() {
        let provider = BraveSearch::new("");
        assert!(!provider.is_configured());
        assert!(matches!(
            provider.search("x", 5).await,
            Err(SearchError::NotConfigured(_))
        ));
    }
}
