//! Serper (Google results) web provider.

use super::{http_client, map_transport_error, opt_str, read_json};
use async_trait::async_trait;
use hottake_core::error::SearchError;
use hottake_core::search::{RawSearchResult, SearchProvider, SourceKind};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";
const MAX_NUM: usize = 10;

pub struct SerperSearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl SerperSearch {
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
impl SearchProvider for SerperSearch {
    fn name(&self) -> &str {
        "serper"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchResult>, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::NotConfigured("serper".into()));
        }

        let num = limit.clamp(1, MAX_NUM);
        debug!(provider = "serper", num, "Searching");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": num }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = read_json("serper", response).await?;
        Ok(parse_response(&body))
    }
}

fn parse_response(body: &serde_json::Value) -> Vec<RawSearchResult> {
    body["organic"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| RawSearchResult {
                    title: opt_str(item, "title").unwrap_or_default(),
                    url: opt_str(item, "link").unwrap_or_default(),
                    snippet: opt_str(item, "snippet"),
                    publisher: None,
                    published: opt_str(item, "date"),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_organic_results() {
        let body = serde_json::json!({
            "searchParameters": {"q": "pizza"},
            "organic": [
                {"title": "Pizza", "link": "https://example.com/p", "snippet": "All about pizza", "date": "Mar 4, 2025", "position": 1},
                {"title": "No link"}
            ]
        });
        let results = parse_response(&body);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://example.com/p");
        assert_eq!(results[0].published.as_deref(), Some("Mar 4, 2025"));
        assert!(results[1].url.is_empty());
    }
}
