//! Error types for pincer-llm

use thiserror::Error;

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured (missing model path, bad URL, ...)
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Backend binary or service could not be started/reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Backend ran but reported failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid or empty response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
