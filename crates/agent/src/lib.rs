//! Orchestration for hottake.
//!
//! A request flows **validate → variant cache → search → prompt → generate**:
//!
//! 1. **Validate** topic, style, agent and article count
//! 2. **Cache**: requests without search may be served from a full variant pool
//! 3. **Search** web and news concurrently; failures only reduce context
//! 4. **Prompt** from the style persona, topic and ranked context
//! 5. **Generate** with the selected agent, in one call or as a token stream
//!
//! Streaming runs are [`StreamSession`]s of [`StreamEvent`]s ending in
//! exactly one `done` or `error`, unless the client cancels first.

pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod session;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::Orchestrator;
pub use request::{HotTakeRequest, ValidRequest};
pub use session::{SessionState, StreamSession};
pub use stream_event::{HotTakeResult, StreamEvent, parse_frame};
