//! NewsAPI news provider (`/v2/everything`).

use super::{http_client, map_transport_error, opt_str, read_json};
use async_trait::async_trait;
use hottake_core::error::SearchError;
use hottake_core::search::{RawSearchResult, SearchProvider, SourceKind};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const MAX_PAGE_SIZE: usize = 100;

pub struct NewsApiSearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl NewsApiSearch {
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
impl SearchProvider for NewsApiSearch {
    fn name(&self) -> &str {
        "newsapi"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchResult>, SearchError> {
        if !self.is_configured() {
            return Err(SearchError::NotConfigured("newsapi".into()));
        }

        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        debug!(provider = "newsapi", page_size = %page_size, "Searching");

        let response = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = read_json("newsapi", response).await?;
        parse_response(&body)
    }
}

fn parse_response(body: &serde_json::Value) -> Result<Vec<RawSearchResult>, SearchError> {
    if body["status"].as_str() != Some("ok") {
        return Err(SearchError::Api {
            status_code: 200,
            message: opt_str(body, "message").unwrap_or_else(|| "status was not ok".into()),
        });
    }

    Ok(body["articles"]
        .as_array()
        .map(|articles| {
            articles
                .iter()
                .map(|article| RawSearchResult {
                    title: opt_str(article, "title").unwrap_or_default(),
                    url: opt_str(article, "url").unwrap_or_default(),
                    snippet: opt_str(article, "description")
                        .or_else(|| opt_str(article, "content")),
                    publisher: opt_str(&article["source"], "name"),
                    published: opt_str(article, "publishedAt"),
                })
                .collect()
        })
        .unwrap_or_default())
}
