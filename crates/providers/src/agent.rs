//! Generation agents: a configured backend plus its model settings.

use hottake_core::error::ProviderError;
use hottake_core::message::Message;
use hottake_core::provider::{ChunkReceiver, Provider, ProviderRequest};
use serde::Serialize;
use std::sync::Arc;

/// The closed set of supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    OpenAi,
    Anthropic,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::OpenAi, AgentKind::Anthropic];

    /// Identifier accepted in requests (`agent_type`).
    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let wanted = id.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.id() == wanted)
    }
}

/// One selectable generation backend.
#[derive(Clone)]
pub struct Agent {
    pub kind: AgentKind,
    pub display_name: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    provider: Arc<dyn Provider>,
}

/// Public description of an agent, as listed by `/api/agents`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub id: &'static str,
    pub name: String,
    pub model: String,
    pub configured: bool,
}

impl Agent {
    pub fn new(
        kind: AgentKind,
        display_name: impl Into<String>,
        model: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            model: model.into(),
            temperature: 0.8,
            max_tokens: 200,
            provider,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            id: self.id(),
            name: self.display_name.clone(),
            model: self.model.clone(),
            configured: self.is_configured(),
        }
    }

    fn request(&self, messages: Vec<Message>, stream: bool) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            stream,
        }
    }

    /// Generate the full text in one call.
    pub async fn generate(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let response = self.provider.complete(self.request(messages, false)).await?;
        Ok(response.content)
    }

    /// Generate as a stream of fragments. Dropping the receiver stops the
    /// producing task.
    pub async fn generate_stream(
        &self,
        messages: Vec<Message>,
    ) -> Result<ChunkReceiver, ProviderError> {
        self.provider.stream(self.request(messages, true)).await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .field("model", &self.model)
            .field("provider", &self.provider.name())
            .finish()
    }
}
