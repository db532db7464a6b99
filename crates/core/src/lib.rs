//! # Hottake Core
//!
//! Domain types, traits, and error definitions for the hottake generation
//! engine. This crate has **zero framework dependencies**: it defines the
//! domain model that the provider, search, cache and orchestration crates
//! implement against.
//!
//! Every external capability is a trait here:
//! - [`Provider`] generates text from an LLM backend
//! - [`SearchProvider`] returns raw web or news hits
//!
//! Implementations live in their respective crates.

pub mod error;
pub mod message;
pub mod provider;
pub mod search;
pub mod style;

// Re-export key types at crate root for ergonomics
pub use error::{CacheError, GenerationError, ProviderError, SearchError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use search::{RawSearchResult, SearchProvider, SourceKind, SourceRecord};
pub use style::Style;
