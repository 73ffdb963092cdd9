use thiserror::Error;

/// Error taxonomy for the retrieval core.
///
/// - `Config` is fatal and never retried: the deployment is unusable.
/// - `RateLimited` is retried exactly once after a cooldown (see
///   `core::retry`); a second occurrence propagates.
/// - `Provider` is a failed mandatory step and propagates to the caller.
/// - `BadRequest` rejects invalid input at the pipeline boundary before any
///   provider call is made.
///
/// Optional-signal failures (lexical index missing, reranker unavailable,
/// image unfetchable) never surface as errors at all: the owning component
/// substitutes its documented fallback value and logs a warning.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl RagError {
    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        RagError::Provider(err.to_string())
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, RagError::RateLimited(_))
    }
}
