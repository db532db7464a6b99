//! Streaming session events.
//!
//! Every session is a sequence of these, serialised as `{"type": ..., ...}`.
//! Exactly one terminal event (`done` or `error`) ends a session that was
//! not cancelled, and nothing follows it.

use hottake_core::search::SourceRecord;
use serde::{Deserialize, Serialize};

/// The complete outcome of one run, identical for both request modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotTakeResult {
    pub hot_take: String,
    pub topic: String,
    pub style: String,
    pub agent_used: String,
    #[serde(default)]
    pub web_search_used: bool,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

/// Events emitted during a streaming run.
///
/// - `status`  - progress message ("Searching the web...")
/// - `sources` - ranked records used as context, possibly empty
/// - `token`   - a fragment of generated text
/// - `done`    - the full result
/// - `error`   - a caller-safe failure message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status { message: String },

    Sources { sources: Vec<SourceRecord> },

    Token { text: String },

    Done {
        #[serde(flatten)]
        result: HotTakeResult,
    },

    Error { detail: String },
}

impl StreamEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn token(text: impl Into<String>) -> Self {
        Self::Token { text: text.into() }
    }

    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Sources { .. } => "sources",
            Self::Token { .. } => "token",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// JSON payload of this event.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// One newline-delimited frame.
    pub fn to_frame(&self) -> String {
        let mut frame = self.to_json();
        frame.push('\n');
        frame
    }
}

/// Parse one frame. Unknown or malformed frames yield `None` so consumers
/// can skip event types they do not understand.
pub fn parse_frame(line: &str) -> Option<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}
