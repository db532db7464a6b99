//! Concurrent web + news search with ranking and filtering.
//!
//! The aggregator never fails: a sub-search that errors, times out or has
//! no configured provider contributes an empty list and a warning.

use crate::providers::{BraveSearch, NewsApiSearch, SerperSearch};
use crate::quality::{self, QualitySettings, SubScores};
use chrono::{DateTime, Utc};
use hottake_config::SearchConfig;
use hottake_core::search::{SearchProvider, SourceKind, SourceRecord};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw hits fetched per sub-search never exceed this.
const MAX_FETCH: usize = 20;

/// What one request wants searched.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub topic: String,
    pub web: bool,
    pub news: bool,
    /// Web provider by name; `None` picks the first configured one.
    pub web_provider: Option<String>,
    pub limit: usize,
    pub strict: bool,
}

impl SearchQuery {
    pub fn is_enabled(&self) -> bool {
        self.web || self.news
    }

    /// How many raw hits to request before ranking.
    pub fn fetch_count(&self) -> usize {
        let factor = if self.strict { 3 } else { 2 };
        (self.limit * factor).min(MAX_FETCH)
    }
}

pub struct SearchAggregator {
    web: Vec<Arc<dyn SearchProvider>>,
    news: Vec<Arc<dyn SearchProvider>>,
    settings: QualitySettings,
    timeout: Duration,
}

impl SearchAggregator {
    pub fn new(settings: QualitySettings, timeout: Duration) -> Self {
        Self {
            web: Vec::new(),
            news: Vec::new(),
            settings,
            timeout,
        }
    }

    /// Register a provider under its own kind. Order matters for web
    /// providers: the first configured one is the default.
    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        match provider.kind() {
            SourceKind::Web => self.web.push(provider),
            SourceKind::News => self.news.push(provider),
        }
        self
    }

    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// Names and configured flags of every registered provider.
    pub fn providers(&self) -> Vec<(&str, SourceKind, bool)> {
        self.web
            .iter()
            .chain(&self.news)
            .map(|p| (p.name(), p.kind(), p.is_configured()))
            .collect()
    }

    fn pick_web(&self, hint: Option<&str>) -> Option<&Arc<dyn SearchProvider>> {
        match hint {
            Some(name) => {
                let found = self.web.iter().find(|p| p.name().eq_ignore_ascii_case(name));
                if found.is_none() {
                    warn!(provider = %name, "Unknown web search provider");
                }
                found
            }
            None => self.web.iter().find(|p| p.is_configured()),
        }
    }

    /// Run the enabled sub-searches concurrently and return ranked records.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SourceRecord> {
        if !query.is_enabled() || query.limit == 0 {
            return Vec::new();
        }

        let now = Utc::now();
        let web_provider = if query.web {
            self.pick_web(query.web_provider.as_deref())
        } else {
            None
        };
        let news_provider = if query.news { self.news.first() } else { None };

        let (web, news) = tokio::join!(
            self.sub_search(web_provider, SourceKind::Web, query, now),
            self.sub_search(news_provider, SourceKind::News, query, now),
        );

        info!(
            web = web.len(),
            news = news.len(),
            strict = query.strict,
            "Search sub-results collected"
        );

        rank(web.into_iter().chain(news).collect(), query, &self.settings, now)
    }

    async fn sub_search(
        &self,
        provider: Option<&Arc<dyn SearchProvider>>,
        kind: SourceKind,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Vec<SourceRecord> {
        let enabled = match kind {
            SourceKind::Web => query.web,
            SourceKind::News => query.news,
        };
        if !enabled {
            return Vec::new();
        }
        let Some(provider) = provider else {
            warn!(kind = %kind, "No search provider available");
            return Vec::new();
        };
        if !provider.is_configured() {
            warn!(provider = provider.name(), "Search provider is not configured");
            return Vec::new();
        }

        let call = provider.search(&query.topic, query.fetch_count());
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(provider = provider.name(), error = %e, "Search failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Search timed out"
                );
                return Vec::new();
            }
        };

        let window = self.settings.recency_days(kind);
        let records: Vec<SourceRecord> = raw
            .into_iter()
            .filter_map(|hit| quality::normalize(hit, kind, now))
            .filter(|record| quality::within_window(record, now, window))
            .collect();
        debug!(provider = provider.name(), kept = records.len(), "Search results normalised");
        records
    }
}

/// Dedupe, score, filter, sort and truncate merged records.
pub fn rank(
    records: Vec<SourceRecord>,
    query: &SearchQuery,
    settings: &QualitySettings,
    now: DateTime<Utc>,
) -> Vec<SourceRecord> {
    let query_tokens = quality::tokenize(&query.topic);
    let mut seen = HashSet::new();

    let mut ranked: Vec<SourceRecord> = records
        .into_iter()
        .filter(|record| seen.insert((record.kind, quality::normalize_url(&record.url))))
        .map(|mut record| {
            record.score = SubScores::compute(&record, &query_tokens, settings, now)
                .final_score(settings, query.strict);
            record
        })
        .filter(|record| settings.domain_allowed(record))
        .collect();

    // `sort_by` is stable, so ties keep discovery order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(query.limit);
    ranked
}

/// Build the aggregator with every provider the config names.
pub fn build_from_config(config: &SearchConfig) -> SearchAggregator {
    let key = |k: &Option<String>| k.clone().unwrap_or_default();

    let brave: Arc<dyn SearchProvider> = Arc::new(BraveSearch::new(key(&config.brave_api_key)));
    let serper: Arc<dyn SearchProvider> = Arc::new(SerperSearch::new(key(&config.serper_api_key)));
    let news: Arc<dyn SearchProvider> = Arc::new(NewsApiSearch::new(key(&config.newsapi_api_key)));

    // The configured default web provider goes first.
    let mut web = vec![brave, serper];
    if let Some(default) = &config.default_web_provider {
        web.sort_by_key(|p| !p.name().eq_ignore_ascii_case(default));
    }

    web.into_iter().chain([news]).fold(
        SearchAggregator::new(
            QualitySettings::from_config(config),
            Duration::from_millis(config.timeout_ms),
        ),
        SearchAggregator::with_provider,
    )
}
