//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly (not an OpenAI-compatible proxy).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Streaming via SSE with `content_block_delta` events

use crate::sse::{LineBuffer, SseLine};
use async_trait::async_trait;
use futures::StreamExt;
use hottake_core::error::ProviderError;
use hottake_core::message::{Message, Role};
use hottake_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: crate::http_client(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Extract system messages from the message list.
    /// Anthropic puts system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut turns = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User => turns.push(AnthropicMessage {
                    role: "user".into(),
                    content: msg.content.clone(),
                }),
                Role::Assistant => turns.push(AnthropicMessage {
                    role: "assistant".into(),
                    content: msg.content.clone(),
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, turns)
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature,
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }
        if stream {
            body["stream"] = serde_json::json!(true);
        }
        body
    }

    async fn send(
        &self,
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let mut builder = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&Self::request_body(request, stream));
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder.send().await.map_err(crate::map_transport_error)?;
        crate::check_status(&self.name, response).await
    }
}

#[async_trait]
impl hottake_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let response = self.send(&request, false).await?;
        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        response_to_provider_response(api_resp)
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        debug!(provider = "anthropic", model = %request.model, "Sending streaming request");

        let response = self.send(&request, true).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::default();
            let mut usage = UsageTally::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    let event = match line {
                        SseLine::Event(name) if name == "message_stop" => StreamEvent::Stop,
                        SseLine::Event(_) => continue,
                        SseLine::Data(data) => parse_stream_data(&data),
                    };

                    match event {
                        StreamEvent::Text(text) => {
                            if tx.send(Ok(StreamChunk::text(text))).await.is_err() {
                                return;
                            }
                        }
                        StreamEvent::InputTokens(n) => usage.input = n,
                        StreamEvent::OutputTokens(n) => usage.output = n,
                        StreamEvent::Stop => {
                            let _ = tx.send(Ok(StreamChunk::finished(usage.finish()))).await;
                            return;
                        }
                        StreamEvent::Failed(message) => {
                            let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                            return;
                        }
                        StreamEvent::Skip => {}
                    }
                }
            }

            // Stream ended without message_stop
            let _ = tx
                .send(Err(ProviderError::StreamInterrupted(
                    "stream closed before message_stop".into(),
                )))
                .await;
        });

        Ok(rx)
    }
}

/// Convert Anthropic API response to our ProviderResponse.
fn response_to_provider_response(
    resp: AnthropicResponse,
) -> std::result::Result<ProviderResponse, ProviderError> {
    let text = resp
        .content
        .iter()
        .filter_map(|block| match block {
            ResponseContentBlock::Text { text } => Some(text.as_str()),
            ResponseContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let content = text.trim();
    if content.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "Anthropic response contained no text".into(),
        ));
    }

    Ok(ProviderResponse {
        content: content.to_string(),
        usage: Some(Usage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
        }),
        model: resp.model,
    })
}

/// Interpretation of one Anthropic SSE line.
#[derive(Debug, PartialEq)]
enum StreamEvent {
    Text(String),
    InputTokens(u32),
    OutputTokens(u32),
    Stop,
    Failed(String),
    Skip,
}

fn parse_stream_data(data: &str) -> StreamEvent {
    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
            return StreamEvent::Skip;
        }
    };

    let tokens = |v: &serde_json::Value| v.as_u64().map(|n| n as u32);

    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" if event["delta"]["type"] == "text_delta" => event["delta"]["text"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map_or(StreamEvent::Skip, |t| StreamEvent::Text(t.to_string())),
        "message_start" => tokens(&event["message"]["usage"]["input_tokens"])
            .map_or(StreamEvent::Skip, StreamEvent::InputTokens),
        "message_delta" => tokens(&event["usage"]["output_tokens"])
            .map_or(StreamEvent::Skip, StreamEvent::OutputTokens),
        "message_stop" => StreamEvent::Stop,
        "error" => StreamEvent::Failed(
            event["error"]["message"]
                .as_str()
                .unwrap_or("unknown stream error")
                .to_string(),
        ),
        _ => StreamEvent::Skip,
    }
}

#[derive(Debug, Default)]
struct UsageTally {
    input: u32,
    output: u32,
}

impl UsageTally {
    fn finish(&self) -> Option<Usage> {
        (self.input + self.output > 0).then(|| Usage {
            prompt_tokens: self.input,
            completion_tokens: self.output,
            total_tokens: self.input + self.output,
        })
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
