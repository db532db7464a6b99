//! Concrete search backends.

pub mod brave;
pub mod newsapi;
pub mod serper;

pub use brave::BraveSearch;
pub use newsapi::NewsApiSearch;
pub use serper::SerperSearch;

use hottake_core::error::SearchError;
use std::time::Duration;
use tracing::warn;

/// Default per-request timeout for search backends.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(REQUEST_TIMEOUT.as_millis() as u64)
    } else {
        SearchError::Network(e.to_string())
    }
}

/// Turn a non-success response into [`SearchError::Api`] and decode JSON otherwise.
pub(crate) async fn read_json(
    provider: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, SearchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), "Search API returned error");
        return Err(SearchError::Api {
            status_code: status.as_u16(),
            message: body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| SearchError::Parse(format!("{provider}: {e}")))
}

/// Read an optional string field, treating empty strings as absent.
pub(crate) fn opt_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
