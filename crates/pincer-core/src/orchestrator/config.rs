//! Orchestrator configuration

use crate::dispatcher::{DispatcherConfig, DEFAULT_TOOL_TIMEOUT};
use std::time::Duration;

/// Default name used in greetings and `/status`
pub const DEFAULT_BOT_NAME: &str = "Pincer";

/// Default system prompt for free-form conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Pincer, a helpful assistant running locally on \
this machine. Be concise and accurate. When you cannot answer, say so.";

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Name shown to users
    pub bot_name: String,
    /// System prompt prepended to every conversation
    pub system_prompt: String,
    /// Tokens to generate per reply
    pub max_tokens: u32,
    /// Sampling temperature; the backend default applies when `None`
    pub temperature: Option<f32>,
    /// Hard cap on one inference call
    pub inference_timeout: Duration,
    /// Turns of history sent with each prompt
    pub history_limit: usize,
    /// Recalled snippets sent with each prompt (0 disables recall)
    pub semantic_top_k: usize,
    /// Budget for tools without their own timeout
    pub default_tool_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 512,
            temperature: None,
            inference_timeout: Duration::from_secs(120),
            history_limit: 20,
            semantic_top_k: 3,
            default_tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bot name
    #[must_use]
    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set max tokens per reply
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the inference budget
    #[must_use]
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Set how many turns of history are sent
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set how many recalled snippets are sent
    #[must_use]
    pub fn with_semantic_top_k(mut self, k: usize) -> Self {
        self.semantic_top_k = k;
        self
    }

    /// Set the default tool budget
    #[must_use]
    pub fn with_default_tool_timeout(mut self, timeout: Duration) -> Self {
        self.default_tool_timeout = timeout;
        self
    }

    pub(crate) fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            default_timeout: self.default_tool_timeout,
        }
    }
}
