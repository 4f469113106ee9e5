use super::types::{ChatMessage, ChatOptions, ChatRequest, ChatResponse, ErrorBody, OllamaConfig};
use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use reqwest::Client;
use tracing::{debug, instrument};

/// Ollama local provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(config: OllamaConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::NotConfigured("empty Ollama base URL".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    /// Check if the daemon answers at all
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        self.client.get(&url).send().await.is_ok()
    }

    pub(crate) fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model.clone()
        };

        ChatRequest {
            model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            options: Some(ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens.or(Some(self.config.default_max_tokens)),
            }),
            stream: false,
        }
    }

    async fn send(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        debug!(model = %request.model, "Sending request to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::Unavailable(format!(
                        "failed to connect to Ollama at {}",
                        self.config.base_url
                    ))
                } else if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(Error::Backend(message));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let response = self.send(self.build_request(&request)).await?;

        let content = response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(Error::InvalidResponse("empty completion".to_string()));
        }

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        Ok(CompletionResponse {
            content,
            usage,
            finish_reason: response.done_reason,
            model: response.model,
        })
    }
}
