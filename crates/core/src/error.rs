//! Error types for the hottake domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; only [`GenerationError`]
//! ever crosses the orchestrator boundary.

use thiserror::Error;

/// Failures raised by a generation backend.
///
/// Every backend maps its transport and protocol failures into this one
/// enum so the orchestrator has a single error path regardless of vendor.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised by a search provider.
///
/// These never reach a caller: the aggregator converts them into an empty
/// contribution at the point of origin.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search provider not configured: {0}")]
    NotConfigured(String),

    #[error("Search request failed: {0}")]
    Network(String),

    #[error("Search API returned status {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),

    #[error("Search timed out after {0}ms")]
    Timeout(u64),
}

/// Failures raised by a cache backing store.
///
/// Treated as "cache disabled" by every caller.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// The single failure shape of an orchestration run.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The caller sent something we refuse before any external call.
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// No usable generation backend.
    #[error("Generation backend not configured: {0}")]
    NotConfigured(String),

    /// The backend failed at runtime.
    #[error("Generation failed: {0}")]
    Failed(#[from] ProviderError),

    /// The end-to-end deadline of a non-streaming request elapsed.
    #[error("Generation timed out after {0}s")]
    Timeout(u64),
}

impl GenerationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this is a caller error (rejected before any external call).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Whether the caller may simply retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Message safe to show to a caller. Provider internals are never
    /// included; they are only logged server-side.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput { field, message } => format!("{field}: {message}"),
            Self::NotConfigured(_) => {
                "No generation agent is configured. Please try again later.".into()
            }
            Self::Failed(_) => "Failed to generate hot take. Please try again.".into(),
            Self::Timeout(_) => "Generation timed out. Please try again.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn public_message_hides_provider_detail() {
        let err = GenerationError::Failed(ProviderError::AuthenticationFailed(
            "sk-live-secret rejected".into(),
        ));
        let shown = err.public_message();
        assert!(!shown.contains("sk-live-secret"));
        assert!(shown.contains("Failed to generate"));
        // Full detail is still available to server-side logging.
        assert!(err.to_string().contains("sk-live-secret"));
    }

    #[test]
    fn only_timeouts_are_retryable() {
        assert!(GenerationError::Timeout(45).is_retryable());
        assert!(!GenerationError::NotConfigured("none".into()).is_retryable());
        assert!(GenerationError::invalid("topic", "empty").is_caller_error());
    }
}
