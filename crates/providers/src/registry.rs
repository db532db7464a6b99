//! Agent registry - builds agents from config and selects one per request.

use crate::agent::{Agent, AgentInfo, AgentKind};
use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use hottake_config::{AgentConfig, AppConfig};
use hottake_core::error::GenerationError;
use hottake_core::provider::Provider;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::debug;

/// Holds every known agent, configured or not.
#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, replacing any previous one of the same kind.
    pub fn register(&mut self, agent: Agent) {
        self.agents.retain(|a| a.kind != agent.kind);
        self.agents.push(agent);
    }

    pub fn get(&self, kind: AgentKind) -> Option<&Agent> {
        self.agents.iter().find(|a| a.kind == kind)
    }

    /// Agents whose backend has the credentials it needs.
    pub fn configured(&self) -> Vec<&Agent> {
        self.agents.iter().filter(|a| a.is_configured()).collect()
    }

    pub fn has_configured(&self) -> bool {
        self.agents.iter().any(Agent::is_configured)
    }

    pub fn list(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(Agent::info).collect()
    }

    /// Pick the agent for one request.
    ///
    /// An explicit `hint` must name a known agent (caller error otherwise)
    /// and that agent must be configured. Without a hint, one configured
    /// agent is chosen uniformly at random.
    pub fn select(&self, hint: Option<&str>) -> Result<Agent, GenerationError> {
        if let Some(id) = hint {
            let kind = AgentKind::from_id(id).ok_or_else(|| {
                GenerationError::invalid("agent_type", format!("unknown agent '{id}'"))
            })?;
            return match self.get(kind) {
                Some(agent) if agent.is_configured() => Ok(agent.clone()),
                _ => Err(GenerationError::NotConfigured(format!(
                    "agent '{}' has no credentials",
                    kind.id()
                ))),
            };
        }

        let configured = self.configured();
        let chosen = configured
            .choose(&mut rand::rng())
            .ok_or_else(|| GenerationError::NotConfigured("no agent has credentials".into()))?;
        debug!(agent = chosen.id(), candidates = configured.len(), "Selected agent");
        Ok((*chosen).clone())
    }
}

/// Build the registry from configuration.
///
/// Every enabled agent is registered, even without a key, so it can be
/// listed as unconfigured.
pub fn build_from_config(config: &AppConfig) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    let max_tokens = config.generation.max_tokens;

    for kind in AgentKind::ALL {
        let agent_config = match kind {
            AgentKind::OpenAi => &config.agents.openai,
            AgentKind::Anthropic => &config.agents.anthropic,
        };
        if !agent_config.enabled {
            continue;
        }

        let provider = build_provider(kind, agent_config);
        registry.register(
            Agent::new(kind, &agent_config.display_name, &agent_config.model, provider)
                .with_temperature(agent_config.temperature)
                .with_max_tokens(max_tokens),
        );
    }

    registry
}

fn build_provider(kind: AgentKind, config: &AgentConfig) -> Arc<dyn Provider> {
    let api_key = config.api_key.clone().unwrap_or_default();
    match kind {
        AgentKind::OpenAi => Arc::new(OpenAiCompatProvider::new(
            kind.id(),
            config
                .api_url
                .as_deref()
                .unwrap_or(crate::openai_compat::DEFAULT_BASE_URL),
            api_key,
        )),
        AgentKind::Anthropic => {
            let provider = AnthropicProvider::new(api_key);
            match &config.api_url {
                Some(url) => Arc::new(provider.with_base_url(url)),
                None => Arc::new(provider),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hottake_core::error::ProviderError;
    use hottake_core::message::Message;
    use hottake_core::provider::{ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    /// A mock provider that echoes its model name.
    struct SuccessProvider {
        configured: bool,
        call_count: Mutex<usize>,
    }

    impl SuccessProvider {
        fn new(configured: bool) -> Self {
            Self {
                configured,
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for SuccessProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            Ok(ProviderResponse {
                content: format!("take from {}", request.model),
                usage: None,
                model: request.model,
            })
        }
    }

    fn registry(openai: bool, anthropic: bool) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        registry.register(Agent::new(
            AgentKind::OpenAi,
            "OpenAI Agent",
            "gpt",
            Arc::new(SuccessProvider::new(openai)),
        ));
        registry.register(Agent::new(
            AgentKind::Anthropic,
            "Claude Agent",
            "claude",
            Arc::new(SuccessProvider::new(anthropic)),
        ));
        registry
    }

    #[test]
    fn explicit_hint_selects_that_agent() {
        let registry = registry(true, true);
        let agent = registry.select(Some("Anthropic")).unwrap();
        assert_eq!(agent.display_name, "Claude Agent");
    }

    #[test]
    fn unknown_hint_is_caller_error() {
        let err = registry(true, true).select(Some("gemini")).unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn unconfigured_hint_is_not_configured() {
        let err = registry(true, false).select(Some("anthropic")).unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }

    #[test]
    fn random_selection_only_picks_configured() {
        let registry = registry(false, true);
        for _ in 0..20 {
            assert_eq!(registry.select(None).unwrap().kind, AgentKind::Anthropic);
        }
    }

    #[test]
    fn random_selection_reaches_every_configured_agent() {
        let registry = registry(true, true);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(registry.select(None).unwrap().kind);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn nothing_configured_fails_distinctly() {
        let err = registry(false, false).select(None).unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
        assert!(!err.is_caller_error());
    }

    #[tokio::test]
    async fn agent_generate_forwards_model_settings() {
        let provider = Arc::new(SuccessProvider::new(true));
        let agent = Agent::new(AgentKind::OpenAi, "OpenAI Agent", "gpt-test", provider.clone())
            .with_max_tokens(50);
        let text = agent.generate(vec![Message::user("hi")]).await.unwrap();
        assert_eq!(text, "take from gpt-test");
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn build_from_default_config_lists_unconfigured_agents() {
        let registry = build_from_config(&AppConfig::default());
        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|a| !a.configured));
        assert!(!registry.has_configured());
    }

    #[test]
    fn build_from_config_respects_keys_and_disable() {
        let mut config = AppConfig::default();
        config.agents.openai.api_key = Some("sk-test".into());
        config.agents.anthropic.enabled = false;
        let registry = build_from_config(&config);
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.select(None).unwrap().display_name, "OpenAI Agent");
    }
}
