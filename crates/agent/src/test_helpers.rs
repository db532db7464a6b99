//! Shared test doubles for orchestrator tests.

use async_trait::async_trait;
use hottake_core::error::{ProviderError, SearchError};
use hottake_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk,
};
use hottake_core::search::{RawSearchResult, SearchProvider, SourceKind};
use std::sync::Mutex;
use std::time::Duration;

/// A provider that streams scripted fragments, or fails.
pub struct ScriptedProvider {
    fragments: Vec<String>,
    failure: Option<ProviderError>,
    configured: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            failure: None,
            configured: true,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(&[])
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(&["never"])
        }
    }

    /// Pause before every fragment (and before a one-shot response).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(ProviderResponse {
            content: self.fragments.concat(),
            usage: None,
            model: request.model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }

        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let fragments = self.fragments.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(Ok(StreamChunk::text(fragment))).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(Ok(StreamChunk::finished(None))).await;
        });
        Ok(rx)
    }
}

/// A search provider returning fixed hits, or failing.
pub struct StaticSearch {
    name: &'static str,
    kind: SourceKind,
    results: Result<Vec<RawSearchResult>, SearchError>,
    calls: Mutex<usize>,
}

impl StaticSearch {
    pub fn new(name: &'static str, kind: SourceKind, results: Vec<RawSearchResult>) -> Self {
        Self {
            name,
            kind,
            results: Ok(results),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(name: &'static str, kind: SourceKind) -> Self {
        Self {
            results: Err(SearchError::Network("connection reset".into())),
            ..Self::new(name, kind, Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RawSearchResult>, SearchError> {
        *self.calls.lock().unwrap() += 1;
        self.results.clone()
    }
}

pub fn hit(title: &str, url: &str, snippet: &str) -> RawSearchResult {
    RawSearchResult {
        title: title.into(),
        url: url.into(),
        snippet: Some(snippet.into()),
        ..RawSearchResult::default()
    }
}
