//! Error types for pincer-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Telegram API error
    #[error("telegram error: {0}")]
    Telegram(String),

    /// Missing or invalid transport configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Message parsing error
    #[error("message parsing error: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
