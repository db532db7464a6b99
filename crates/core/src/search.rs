//! Search provider trait and the normalized search record.

use crate::error::SearchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which sub-search produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    News,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::News => "news",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hit as a provider returned it, before normalization.
///
/// `published` is kept as the raw string because providers disagree on
/// format ("2 days ago", RFC 3339, "Mar 4, 2025").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
}

/// One normalized search hit.
///
/// `(kind, url)` is unique within any list the aggregator returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Ranking score; computed per request and never sent on the wire.
    #[serde(skip)]
    pub score: f64,
}

/// A web or news search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider identifier (e.g., "brave", "serper", "newsapi").
    fn name(&self) -> &str;

    /// Which kind of records this provider yields.
    fn kind(&self) -> SourceKind;

    /// Whether required credentials are present.
    fn is_configured(&self) -> bool;

    /// Run one query and return at most `limit` raw hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchResult>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_record_wire_shape() {
        let record = SourceRecord {
            kind: SourceKind::Web,
            title: "Test".into(),
            url: "https://example.com".into(),
            snippet: None,
            publisher: Some("example.com".into()),
            published_at: None,
            score: 0.9,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "web");
        assert_eq!(json["url"], "https://example.com");
        assert!(json.get("score").is_none());
        assert!(json.get("snippet").is_none());
    }
}
