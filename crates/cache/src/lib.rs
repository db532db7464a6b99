//! Variant cache for hottake.
//!
//! A [`VariantCache`] keeps a small pool of previously generated takes per
//! (topic, style, agent) key. Pools live in a [`CacheStore`]: Redis when
//! several instances share state, or process memory for a single node.

pub mod in_memory;
pub mod redis_store;
pub mod store;
pub mod variant;

pub use in_memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use store::CacheStore;
pub use variant::{CacheKey, CachedVariant, Lookup, VariantCache};
