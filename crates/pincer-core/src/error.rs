//! Error types for pincer-core
//!
//! The taxonomy mirrors how failures surface: configuration problems stop the
//! process, everything else is turned into a fixed user-facing message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the security gate refused a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DenialReason {
    /// Caller is not on the allowlist
    NotAllowlisted,
    /// Caller exhausted the rate budget
    RateLimited {
        /// Whole seconds until the oldest call leaves the window
        retry_after_secs: u64,
    },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowlisted => write!(f, "not allowlisted"),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "rate limited (retry in {}s)", retry_after_secs)
            }
        }
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Startup-time configuration error; the process must not start
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller refused by the security gate
    #[error("access denied: {0}")]
    AuthDenied(DenialReason),

    /// A tool failed
    #[error("tool '{tool}' failed: {detail}")]
    ToolFault {
        /// Tool name
        tool: String,
        /// Operator-facing detail
        detail: String,
    },

    /// A tool exceeded its budget
    #[error("tool '{tool}' timed out after {timeout_ms}ms")]
    ToolTimeout {
        /// Tool name
        tool: String,
        /// Budget that was exceeded
        timeout_ms: u64,
    },

    /// The inference backend could not produce a completion
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),
}

impl From<pincer_llm::Error> for Error {
    fn from(e: pincer_llm::Error) -> Self {
        Self::InferenceUnavailable(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
///
/// `user_message` never includes the error's internal detail.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Config(_) => "Pincer is misconfigured and cannot start.".to_string(),
            Error::AuthDenied(DenialReason::NotAllowlisted) => {
                "You are not authorised to use this bot.".to_string()
            }
            Error::AuthDenied(DenialReason::RateLimited { retry_after_secs }) => format!(
                "Too many requests. Please slow down and try again in {}s.",
                (*retry_after_secs).max(1)
            ),
            Error::ToolFault { .. } => {
                "Sorry, something went wrong while handling that. Please try again.".to_string()
            }
            Error::ToolTimeout { .. } => {
                "Sorry, that took too long and was cancelled.".to_string()
            }
            Error::InferenceUnavailable(_) => {
                "Sorry, I can't reach my language model right now. Please try again later."
                    .to_string()
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Config(_) => {
                Some("Check config/default.toml and PINCER_* environment variables.".to_string())
            }
            Error::ToolTimeout { .. } => Some("Try a smaller request.".to_string()),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI (operators see the detail)
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = format!("{}\n{}", error.user_message(), error);
    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }
    output
}
