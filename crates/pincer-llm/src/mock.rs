//! Mock LLM Provider for testing
//!
//! Returns queued responses (or failures) in order, then a fixed default.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A mock LLM provider that returns queued responses or a default one.
pub struct MockProvider {
    queue: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
    down: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            down: false,
        }
    }

    /// A provider whose every call fails, as if the backend were down.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            down: true,
            ..Self::new()
        }
    }

    /// Sleep this long before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response.
    pub fn push_response(&self, content: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(content.into()));
    }

    /// Queue a failure.
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(reason.into()));
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.down {
            return Err(Error::Unavailable("mock backend is down".to_string()));
        }

        let next = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "mock-model".to_string(),
            }),
            Some(Err(reason)) => Err(Error::Unavailable(reason)),
            None => Ok(CompletionResponse {
                content: "mock response".to_string(),
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "mock-model".to_string(),
            }),
        }
    }
}
