//! Incoming generation requests and their validation.

use hottake_core::error::GenerationError;
use hottake_core::style::Style;
use hottake_providers::AgentKind;
use hottake_search::SearchQuery;
use serde::{Deserialize, Serialize};

pub const MAX_TOPIC_CHARS: usize = 500;
pub const MAX_ARTICLES: usize = hottake_config::MAX_SEARCH_RESULTS;

/// A generation request as clients send it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotTakeRequest {
    pub topic: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub use_web_search: bool,
    #[serde(default)]
    pub use_news_search: bool,
    #[serde(default)]
    pub web_search_provider: Option<String>,
    #[serde(default)]
    pub max_articles: Option<usize>,
    #[serde(default)]
    pub strict_quality_mode: bool,
}

impl HotTakeRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent_type = Some(agent.into());
        self
    }

    /// Check every field before any external call is made.
    pub fn validate(&self, default_articles: usize) -> Result<ValidRequest, GenerationError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::invalid("topic", "must not be empty"));
        }
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(GenerationError::invalid(
                "topic",
                format!("must be at most {MAX_TOPIC_CHARS} characters"),
            ));
        }

        let style = match non_blank(&self.style) {
            Some(name) => name.parse::<Style>().map_err(|e| {
                GenerationError::invalid(
                    "style",
                    format!("{e}; expected one of: {}", Style::names().join(", ")),
                )
            })?,
            None => Style::default(),
        };

        let agent = match non_blank(&self.agent_type) {
            Some(id) => Some(AgentKind::from_id(id).ok_or_else(|| {
                GenerationError::invalid("agent_type", format!("unknown agent '{id}'"))
            })?),
            None => None,
        };

        let limit = self.max_articles.unwrap_or(default_articles);
        if !(1..=MAX_ARTICLES).contains(&limit) {
            return Err(GenerationError::invalid(
                "max_articles",
                format!("must be between 1 and {MAX_ARTICLES}"),
            ));
        }

        Ok(ValidRequest {
            topic: topic.to_string(),
            style,
            agent,
            search: SearchQuery {
                topic: topic.to_string(),
                web: self.use_web_search,
                news: self.use_news_search,
                web_provider: non_blank(&self.web_search_provider).map(String::from),
                limit,
                strict: self.strict_quality_mode,
            },
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRequest {
    pub topic: String,
    pub style: Style,
    pub agent: Option<AgentKind>,
    pub search: SearchQuery,
}

impl ValidRequest {
    /// Only requests without search context may use the variant cache.
    pub fn is_cache_eligible(&self) -> bool {
        !self.search.is_enabled()
    }
}
