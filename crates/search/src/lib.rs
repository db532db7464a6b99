//! Search aggregation for hottake.
//!
//! Queries web and news providers concurrently, normalises their hits into
//! [`SourceRecord`](hottake_core::SourceRecord)s, then dedupes, scores,
//! filters and ranks them. The result feeds the generation context.

pub mod aggregator;
pub mod context;
pub mod providers;
pub mod quality;

pub use aggregator::{SearchAggregator, SearchQuery, build_from_config, rank};
pub use context::build_context;
pub use quality::QualitySettings;
