//! The orchestrator: cache → search → prompt → generation.
//!
//! Both request modes run the same steps:
//!
//! 1. **Validate** the request (caller errors stop here)
//! 2. **Variant cache** for requests without search; a full pool short-circuits
//! 3. **Search** web and news concurrently; failures only shrink the context
//! 4. **Select** an agent and **assemble** the prompt
//! 5. **Generate**, then store the take in the pool if the request was cacheable
//!
//! Streaming runs surface each step as [`StreamEvent`]s on a
//! [`StreamSession`]; closing that session cancels the run.

use crate::prompt;
use crate::request::{HotTakeRequest, ValidRequest};
use crate::session::{Cancelled, SessionState, SessionWriter, StreamSession};
use crate::stream_event::{HotTakeResult, StreamEvent};
use hottake_cache::{CacheKey, CachedVariant, Lookup, VariantCache};
use hottake_config::{AppConfig, GenerationConfig};
use hottake_core::error::{GenerationError, ProviderError};
use hottake_core::message::Message;
use hottake_core::search::SourceRecord;
use hottake_providers::{Agent, AgentRegistry};
use hottake_search::{SearchAggregator, build_context};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, info, info_span, warn};

pub const STATUS_CACHED: &str = "Loading cached take...";
pub const STATUS_WEB: &str = "Searching the web...";
pub const STATUS_NEWS: &str = "Searching news...";
pub const STATUS_GENERATING: &str = "Generating...";

/// Orchestrates one request at a time; share it behind an `Arc`.
pub struct Orchestrator {
    agents: AgentRegistry,
    search: SearchAggregator,
    cache: VariantCache,
    settings: GenerationConfig,
    default_articles: usize,
}

impl Orchestrator {
    pub fn new(
        agents: AgentRegistry,
        search: SearchAggregator,
        cache: VariantCache,
        settings: GenerationConfig,
    ) -> Self {
        Self {
            agents,
            search,
            cache,
            settings,
            default_articles: 5,
        }
    }

    /// Article count used when a request does not name one.
    pub fn with_default_articles(mut self, count: usize) -> Self {
        self.default_articles = count;
        self
    }

    /// Wire every component from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            hottake_providers::build_from_config(config),
            hottake_search::build_from_config(&config.search),
            VariantCache::build_from_config(&config.cache),
            config.generation.clone(),
        )
        .with_default_articles(config.search.default_max_results)
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn search(&self) -> &SearchAggregator {
        &self.search
    }

    pub fn cache(&self) -> &VariantCache {
        &self.cache
    }

    /// What is missing before the service can generate anything.
    pub fn missing_configuration(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.agents.has_configured() {
            missing.push(
                "At least one AI provider API key (OPENAI_API_KEY or ANTHROPIC_API_KEY) is required"
                    .to_string(),
            );
        }
        missing
    }

    // ── Non-streaming ─────────────────────────────────────────────────────

    /// Run a request to completion under the end-to-end deadline.
    pub async fn handle(&self, request: &HotTakeRequest) -> Result<HotTakeResult, GenerationError> {
        let valid = request.validate(self.default_articles)?;
        let secs = self.settings.request_timeout_secs;

        match tokio::time::timeout(Duration::from_secs(secs), self.run(&valid)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(topic = %valid.topic, timeout_secs = secs, "Request deadline exceeded");
                Err(GenerationError::Timeout(secs))
            }
        }
    }

    async fn run(&self, valid: &ValidRequest) -> Result<HotTakeResult, GenerationError> {
        let key = cache_key(valid);
        if let Some(key) = &key
            && let Lookup::Hit { variant, .. } = self.cache.lookup(key).await
        {
            return Ok(cached_result(valid, variant));
        }

        let sources = self.search.search(&valid.search).await;
        let context = build_context(&sources, self.settings.context_char_budget);
        let agent = self.select_agent(valid)?;

        let messages = prompt::build_messages(valid.style, &valid.topic, context.as_deref());
        let hot_take = agent
            .generate(messages)
            .await
            .and_then(non_empty)
            .map_err(|e| generation_failed(&agent, e))?;

        info!(
            agent = agent.id(),
            sources = sources.len(),
            chars = hot_take.len(),
            "Hot take generated"
        );

        let result = fresh_result(valid, &agent, hot_take, context.is_some(), sources);
        if let Some(key) = &key {
            self.store_variant(key, &result).await;
        }
        Ok(result)
    }

    // ── Streaming ─────────────────────────────────────────────────────────

    /// Start a streaming run. Only caller errors are returned here; every
    /// later failure arrives as the session's `error` event.
    pub fn handle_stream(
        self: &Arc<Self>,
        request: &HotTakeRequest,
    ) -> Result<StreamSession, GenerationError> {
        let valid = request.validate(self.default_articles)?;
        let (session, mut writer) = StreamSession::channel();
        let span = info_span!("stream", session = %session.id(), topic = %valid.topic);

        let orchestrator = Arc::clone(self);
        tokio::spawn(
            async move {
                match orchestrator.run_stream(&valid, &mut writer).await {
                    Ok(()) => debug!(state = ?writer.state(), "Stream finished"),
                    Err(Cancelled) => info!(state = ?writer.state(), "Stream cancelled by client"),
                }
            }
            .instrument(span),
        );

        Ok(session)
    }

    async fn run_stream(
        &self,
        valid: &ValidRequest,
        writer: &mut SessionWriter,
    ) -> Result<(), Cancelled> {
        let key = cache_key(valid);
        if let Some(key) = &key
            && let Lookup::Hit { variant, .. } = self.cache.lookup(key).await
        {
            writer.advance(SessionState::Generating);
            writer.send(StreamEvent::status(STATUS_CACHED)).await?;
            self.replay(&variant.hot_take, writer).await?;
            return writer.finish(cached_result(valid, variant)).await;
        }

        writer.advance(SessionState::Aggregating);
        if valid.search.web {
            writer.send(StreamEvent::status(STATUS_WEB)).await?;
        }
        if valid.search.news {
            writer.send(StreamEvent::status(STATUS_NEWS)).await?;
        }
        let sources = tokio::select! {
            biased;
            _ = writer.closed() => return Err(Cancelled),
            sources = self.search.search(&valid.search) => sources,
        };
        writer
            .send(StreamEvent::Sources {
                sources: sources.clone(),
            })
            .await?;
        let context = build_context(&sources, self.settings.context_char_budget);

        writer.advance(SessionState::Generating);
        let agent = match self.select_agent(valid) {
            Ok(agent) => agent,
            Err(e) => return writer.fail(e.public_message()).await,
        };
        writer.send(StreamEvent::status(STATUS_GENERATING)).await?;

        let messages = prompt::build_messages(valid.style, &valid.topic, context.as_deref());
        let hot_take = match self.stream_tokens(&agent, messages, writer).await? {
            Ok(text) => text,
            Err(e) => {
                let e = generation_failed(&agent, e);
                return writer.fail(e.public_message()).await;
            }
        };

        let result = fresh_result(valid, &agent, hot_take, context.is_some(), sources);
        writer.finish(result.clone()).await?;

        // Only a run the client saw finish is stored.
        if let Some(key) = &key {
            self.store_variant(key, &result).await;
        }
        Ok(())
    }

    /// Forward provider fragments as `token` events.
    ///
    /// The outer `Result` is cancellation, the inner one generation failure.
    async fn stream_tokens(
        &self,
        agent: &Agent,
        messages: Vec<Message>,
        writer: &mut SessionWriter,
    ) -> Result<Result<String, ProviderError>, Cancelled> {
        let started = tokio::select! {
            biased;
            _ = writer.closed() => return Err(Cancelled),
            started = agent.generate_stream(messages) => started,
        };
        let mut chunks = match started {
            Ok(chunks) => chunks,
            Err(e) => return Ok(Err(e)),
        };

        let mut text = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = writer.closed() => return Err(Cancelled),
                next = chunks.recv() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    if let Some(fragment) = chunk.content.filter(|f| !f.is_empty()) {
                        text.push_str(&fragment);
                        writer.send(StreamEvent::token(fragment)).await?;
                    }
                    if chunk.done {
                        break;
                    }
                }
                Some(Err(e)) => return Ok(Err(e)),
                None => break,
            }
        }
        Ok(non_empty(text))
    }

    /// Replay a stored take as word-sized `token` events.
    async fn replay(&self, text: &str, writer: &mut SessionWriter) -> Result<(), Cancelled> {
        let delay = Duration::from_millis(self.settings.stream_replay_delay_ms);
        for fragment in word_fragments(text) {
            writer.send(StreamEvent::token(fragment)).await?;
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = writer.closed() => return Err(Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
        Ok(())
    }

    // ── Shared steps ──────────────────────────────────────────────────────

    fn select_agent(&self, valid: &ValidRequest) -> Result<Agent, GenerationError> {
        self.agents
            .select(valid.agent.map(|kind| kind.id()))
            .inspect_err(|e| error!(error = %e, "No agent available"))
    }

    async fn store_variant(&self, key: &CacheKey, result: &HotTakeResult) {
        let variant = CachedVariant {
            hot_take: result.hot_take.clone(),
            agent_used: result.agent_used.clone(),
        };
        let pool_size = self.cache.append(key, &variant).await;
        debug!(key = %key, pool_size, "Variant appended");
    }
}

fn cache_key(valid: &ValidRequest) -> Option<CacheKey> {
    valid.is_cache_eligible().then(|| {
        CacheKey::new(&valid.topic, valid.style, valid.agent.map(|kind| kind.id()))
    })
}

fn cached_result(valid: &ValidRequest, variant: CachedVariant) -> HotTakeResult {
    HotTakeResult {
        hot_take: variant.hot_take,
        topic: valid.topic.clone(),
        style: valid.style.to_string(),
        agent_used: variant.agent_used,
        web_search_used: false,
        sources: Vec::new(),
    }
}

fn fresh_result(
    valid: &ValidRequest,
    agent: &Agent,
    hot_take: String,
    context_used: bool,
    sources: Vec<SourceRecord>,
) -> HotTakeResult {
    HotTakeResult {
        hot_take,
        topic: valid.topic.clone(),
        style: valid.style.to_string(),
        agent_used: agent.display_name.clone(),
        web_search_used: context_used,
        sources,
    }
}

fn non_empty(text: String) -> Result<String, ProviderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ProviderError::MalformedResponse("empty generation".into()))
    } else {
        Ok(trimmed.to_string())
    }
}

fn generation_failed(agent: &Agent, e: ProviderError) -> GenerationError {
    error!(agent = agent.id(), model = %agent.model, error = %e, "Generation failed");
    GenerationError::Failed(e)
}

/// Split into words, each keeping its trailing whitespace, so the
/// fragments concatenate back to `text`.
fn word_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut after_space = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            after_space = true;
        } else if after_space {
            fragments.push(&text[start..i]);
            start = i;
            after_space = false;
        }
    }
    if start < text.len() {
        fragments.push(&text[start..]);
    }
    fragments
}
