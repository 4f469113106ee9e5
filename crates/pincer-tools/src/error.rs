//! Error types for pincer-tools

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// Tool not found
    #[error("tool not found: {0}")]
    NotFound(String),

    /// A tool with the same name is already registered
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    /// Tool spec failed validation (empty trigger, bad pattern, ...)
    #[error("invalid tool spec for '{tool}': {reason}")]
    InvalidSpec {
        /// Tool name
        tool: String,
        /// What is wrong with it
        reason: String,
    },

    /// Tool execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Permission denied
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Inference backend failure (for inference-backed tools)
    #[error("inference error: {0}")]
    Inference(#[from] pincer_llm::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure was caused by the caller's input rather than the tool
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
