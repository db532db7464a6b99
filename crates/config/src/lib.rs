//! Configuration loading, validation, and management for hottake.
//!
//! Loads configuration from `$HOTTAKE_CONFIG` (or `./hottake.toml`) with
//! environment variable overrides for credentials and list settings.
//! Validates all settings at startup; a configuration whose score weights
//! do not sum to 1.0 is rejected.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance used when checking that score weights sum to 1.0.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Most sources a single request may keep after ranking.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation backends
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Search providers and ranking
    #[serde(default)]
    pub search: SearchConfig,

    /// Variant cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Prompt and request limits
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

// ── Agents ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "AgentConfig::openai")]
    pub openai: AgentConfig,

    #[serde(default = "AgentConfig::anthropic")]
    pub anthropic: AgentConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            openai: AgentConfig::openai(),
            anthropic: AgentConfig::anthropic(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Set to false to hide the backend even when a key is present.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    pub model: String,

    pub display_name: String,

    #[serde(default = "default_agent_temperature")]
    pub temperature: f32,
}

fn default_agent_temperature() -> f32 {
    0.8
}

impl AgentConfig {
    fn openai() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_url: None,
            model: "gpt-4.1-mini".into(),
            display_name: "OpenAI Agent".into(),
            temperature: default_agent_temperature(),
        }
    }

    fn anthropic() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_url: None,
            model: "claude-3-5-haiku-latest".into(),
            display_name: "Claude Agent".into(),
            temperature: default_agent_temperature(),
        }
    }

    /// Whether the backend has the credentials it needs.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("display_name", &self.display_name)
            .field("temperature", &self.temperature)
            .finish()
    }
}

// ── Search ────────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brave_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serper_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsapi_api_key: Option<String>,

    /// Web provider used when a request names none. Unset = first configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_web_provider: Option<String>,

    #[serde(default = "default_max_results")]
    pub default_max_results: usize,

    /// Upper bound on each individual sub-search.
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_web_recency_days")]
    pub web_recency_days: u32,

    #[serde(default = "default_news_recency_days")]
    pub news_recency_days: u32,

    #[serde(default)]
    pub weights: ScoreWeights,

    /// Multiplier applied in strict mode to low-relevance records.
    #[serde(default = "default_strict_penalty")]
    pub strict_penalty: f64,

    /// Relevance below this counts as low overlap in strict mode.
    #[serde(default = "default_strict_relevance_threshold")]
    pub strict_relevance_threshold: f64,

    #[serde(default)]
    pub trusted_domains: Vec<String>,

    #[serde(default)]
    pub domain_allowlist: Vec<String>,

    #[serde(default)]
    pub domain_blocklist: Vec<String>,
}

fn default_max_results() -> usize {
    5
}
fn default_search_timeout_ms() -> u64 {
    15_000
}
fn default_web_recency_days() -> u32 {
    30
}
fn default_news_recency_days() -> u32 {
    7
}
fn default_strict_penalty() -> f64 {
    0.35
}
fn default_strict_relevance_threshold() -> f64 {
    0.2
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            brave_api_key: None,
            serper_api_key: None,
            newsapi_api_key: None,
            default_web_provider: None,
            default_max_results: default_max_results(),
            timeout_ms: default_search_timeout_ms(),
            web_recency_days: default_web_recency_days(),
            news_recency_days: default_news_recency_days(),
            weights: ScoreWeights::default(),
            strict_penalty: default_strict_penalty(),
            strict_relevance_threshold: default_strict_relevance_threshold(),
            trusted_domains: Vec::new(),
            domain_allowlist: Vec::new(),
            domain_blocklist: Vec::new(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("brave_api_key", &redact(&self.brave_api_key))
            .field("serper_api_key", &redact(&self.serper_api_key))
            .field("newsapi_api_key", &redact(&self.newsapi_api_key))
            .field("default_web_provider", &self.default_web_provider)
            .field("default_max_results", &self.default_max_results)
            .field("timeout_ms", &self.timeout_ms)
            .field("web_recency_days", &self.web_recency_days)
            .field("news_recency_days", &self.news_recency_days)
            .field("weights", &self.weights)
            .field("strict_penalty", &self.strict_penalty)
            .field("strict_relevance_threshold", &self.strict_relevance_threshold)
            .field("trusted_domains", &self.trusted_domains)
            .field("domain_allowlist", &self.domain_allowlist)
            .field("domain_blocklist", &self.domain_blocklist)
            .finish()
    }
}

/// Weights of the four ranking sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_relevance_weight")]
    pub relevance: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_snippet_weight")]
    pub snippet: f64,
    #[serde(default = "default_domain_weight")]
    pub domain: f64,
}

fn default_relevance_weight() -> f64 {
    0.60
}
fn default_recency_weight() -> f64 {
    0.20
}
fn default_snippet_weight() -> f64 {
    0.10
}
fn default_domain_weight() -> f64 {
    0.10
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            relevance: default_relevance_weight(),
            recency: default_recency_weight(),
            snippet: default_snippet_weight(),
            domain: default_domain_weight(),
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.relevance + self.recency + self.snippet + self.domain
    }

    /// Check every weight is in [0, 1] and that they sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parts = [
            ("relevance", self.relevance),
            ("recency", self.recency),
            ("snippet", self.snippet),
            ("domain", self.domain),
        ];
        for (name, value) in parts {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "search.weights.{name} must be between 0.0 and 1.0 (got {value})"
                )));
            }
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::ValidationError(format!(
                "search.weights must sum to 1.0 (got {:.4})",
                self.sum()
            )));
        }
        Ok(())
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────

/// Which backing store holds variant pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis when `redis_url` is set, otherwise disabled.
    Redis,
    /// Process-local store (single instance only).
    Memory,
    /// Caching disabled.
    None,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,

    #[serde(default = "default_variant_pool_size")]
    pub variant_pool_size: usize,

    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on a single store operation.
    #[serde(default = "default_cache_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Redis
}
fn default_variant_pool_size() -> usize {
    5
}
fn default_cache_ttl_secs() -> u64 {
    86_400
}
fn default_cache_op_timeout_ms() -> u64 {
    500
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: None,
            variant_pool_size: default_variant_pool_size(),
            ttl_secs: default_cache_ttl_secs(),
            op_timeout_ms: default_cache_op_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("backend", &self.backend)
            .field("redis_url", &redact(&self.redis_url))
            .field("variant_pool_size", &self.variant_pool_size)
            .field("ttl_secs", &self.ttl_secs)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .finish()
    }
}

// ── Generation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// End-to-end deadline for non-streaming requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Character budget of the aggregated search context.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,

    /// Pause between replayed fragments of a cached variant (0 = none).
    #[serde(default)]
    pub stream_replay_delay_ms: u64,
}

fn default_max_tokens() -> u32 {
    200
}
fn default_request_timeout_secs() -> u64 {
    45
}
fn default_context_char_budget() -> usize {
    4_000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            context_char_budget: default_context_char_budget(),
            stream_replay_delay_ms: 0,
        }
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Requests allowed per client per minute.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: usize,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".into(), "http://localhost:3000".into()]
}
fn default_rate_limit() -> usize {
    30
}
fn default_max_body_bytes() -> usize {
    16 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
            rate_limit_per_minute: default_rate_limit(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from `$HOTTAKE_CONFIG` or `./hottake.toml`, then
    /// apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration file path.
    pub fn config_path() -> PathBuf {
        std::env::var("HOTTAKE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("hottake.toml"))
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Credentials from the environment win over the file; list settings
    /// are comma separated.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.agents.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.agents.anthropic.api_key = Some(key);
        }
        if let Some(key) = non_empty("BRAVE_API_KEY") {
            self.search.brave_api_key = Some(key);
        }
        if let Some(key) = non_empty("SERPER_API_KEY") {
            self.search.serper_api_key = Some(key);
        }
        if let Some(key) = non_empty("NEWSAPI_API_KEY") {
            self.search.newsapi_api_key = Some(key);
        }
        if let Some(url) = non_empty("REDIS_URL") {
            self.cache.redis_url = Some(url);
        }
        if let Some(size) = non_empty("CACHE_VARIANT_POOL_SIZE").and_then(|v| v.parse().ok()) {
            self.cache.variant_pool_size = size;
        }
        if let Some(ttl) = non_empty("CACHE_TTL_SECONDS").and_then(|v| v.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(list) = non_empty("SEARCH_TRUSTED_DOMAINS") {
            self.search.trusted_domains = split_csv(&list);
        }
        if let Some(list) = non_empty("SEARCH_DOMAIN_ALLOWLIST") {
            self.search.domain_allowlist = split_csv(&list);
        }
        if let Some(list) = non_empty("SEARCH_DOMAIN_BLOCKLIST") {
            self.search.domain_blocklist = split_csv(&list);
        }
        if let Some(list) = non_empty("CORS_ORIGINS") {
            self.gateway.cors_origins = split_csv(&list);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.weights.validate()?;

        if !(0.0..=1.0).contains(&self.search.strict_penalty) {
            return Err(ConfigError::ValidationError(
                "search.strict_penalty must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.search.strict_relevance_threshold) {
            return Err(ConfigError::ValidationError(
                "search.strict_relevance_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&self.search.default_max_results) {
            return Err(ConfigError::ValidationError(format!(
                "search.default_max_results must be between 1 and {MAX_SEARCH_RESULTS}"
            )));
        }
        if self.search.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "search.timeout_ms must be > 0".into(),
            ));
        }
        if self.cache.variant_pool_size == 0 {
            return Err(ConfigError::ValidationError(
                "cache.variant_pool_size must be at least 1".into(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_secs must be > 0".into(),
            ));
        }
        if self.generation.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.request_timeout_secs must be > 0".into(),
            ));
        }
        for (id, agent) in [("openai", &self.agents.openai), ("anthropic", &self.agents.anthropic)] {
            if agent.temperature < 0.0 || agent.temperature > 2.0 {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{id}.temperature must be between 0.0 and 2.0"
                )));
            }
        }

        Ok(())
    }

    /// Whether at least one generation backend has credentials.
    pub fn has_any_agent(&self) -> bool {
        [&self.agents.openai, &self.agents.anthropic]
            .iter()
            .any(|a| a.enabled && a.has_api_key())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.variant_pool_size, 5);
        assert!((config.search.weights.sum() - 1.0).abs() < 1e-9);
        assert!((config.search.strict_penalty - 0.35).abs() < f64::EPSILON);
    }

    #[test]
    fn non_summing_weights_rejected() {
        let mut config = AppConfig::default();
        config.search.weights.relevance = 0.7;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn out_of_range_weight_rejected() {
        let mut config = AppConfig::default();
        config.search.weights = ScoreWeights {
            relevance: 1.2,
            recency: -0.2,
            snippet: 0.0,
            domain: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_pool_size_rejected() {
        let mut config = AppConfig::default();
        config.cache.variant_pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agents.openai.model, config.agents.openai.model);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/hottake.toml")).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Redis);
    }

    #[test]
    fn file_with_bad_weights_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search.weights]
relevance = 0.5
recency = 0.2
snippet = 0.1
domain = 0.1
"#
        )
        .unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[cache]
backend = "memory"
variant_pool_size = 3

[agents.anthropic]
model = "claude-test"
display_name = "Claude Agent"
"#
        )
        .unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.variant_pool_size, 3);
        assert_eq!(config.agents.anthropic.model, "claude-test");
        assert_eq!(config.agents.openai.model, "gpt-4.1-mini");
        assert_eq!(config.search.web_recency_days, 30);
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("ANTHROPIC_API_KEY", "  "),
            ("SEARCH_TRUSTED_DOMAINS", "reuters.com, apnews.com ,"),
            ("CACHE_VARIANT_POOL_SIZE", "7"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert!(config.agents.openai.has_api_key());
        assert!(!config.agents.anthropic.has_api_key());
        assert_eq!(config.search.trusted_domains, vec!["reuters.com", "apnews.com"]);
        assert_eq!(config.cache.variant_pool_size, 7);
        assert!(config.has_any_agent());
    }

    #[test]
    fn default_max_results_must_be_a_valid_request_limit() {
        for bad in [0, MAX_SEARCH_RESULTS + 1, 20] {
            let mut config = AppConfig::default();
            config.search.default_max_results = bad;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("default_max_results"), "{bad}: {err}");
        }

        let mut config = AppConfig::default();
        config.search.default_max_results = MAX_SEARCH_RESULTS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.agents.openai.api_key = Some("sk-very-secret".into());
        config.search.brave_api_key = Some("brave-secret".into());
        let shown = format!("{config:?}");
        assert!(!shown.contains("sk-very-secret"));
        assert!(!shown.contains("brave-secret"));
        assert!(shown.contains("[REDACTED]"));
    }
}
