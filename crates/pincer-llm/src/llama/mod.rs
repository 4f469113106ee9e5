//! llama.cpp CLI backend
//!
//! Each completion spawns `llama-cli` once and the process exits afterwards,
//! so model memory is released between turns. The child is killed if the
//! future driving it is dropped (e.g. by a dispatcher timeout).

mod config;
mod prompt;

#[cfg(test)]
mod tests;

pub use config::{LlamaConfig, DEFAULT_BINARY};
pub use prompt::{build_chatml_prompt, extract_completion};

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, instrument};

/// llama-cli subprocess provider
pub struct LlamaCliProvider {
    config: LlamaConfig,
    model_name: String,
}

impl LlamaCliProvider {
    /// Create a new provider
    #[must_use]
    pub fn new(config: LlamaConfig) -> Self {
        let model_name = config
            .model_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unconfigured".to_string());
        Self { config, model_name }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::new(LlamaConfig::from_env())
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &LlamaConfig {
        &self.config
    }

    async fn run(&self, prompt: &str, n_predict: u32) -> Result<String> {
        let model_path = self.config.model_path.as_ref().ok_or_else(|| {
            Error::NotConfigured("no model path set (LLAMA_MODEL_PATH)".to_string())
        })?;

        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("--model")
            .arg(model_path)
            .arg("--threads")
            .arg(self.config.threads.to_string())
            .arg("--ctx-size")
            .arg(self.config.ctx_size.to_string())
            .arg("--n-predict")
            .arg(n_predict.to_string())
            .arg("--n-gpu-layers")
            .arg(self.config.gpu_layers.to_string())
            .arg("--log-disable")
            .arg("--prompt")
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(binary = %self.config.binary, n_predict, "Spawning llama-cli");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Unavailable(format!(
                    "llama-cli binary not found at '{}'",
                    self.config.binary
                ))
            } else {
                Error::Unavailable(e.to_string())
            }
        })?;

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout(self.config.timeout.as_millis() as u64))?
            .map_err(|e| Error::Backend(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.chars().take(500).collect();
            error!(code = ?output.status.code(), stderr = %stderr, "llama-cli failed");
            return Err(Error::Backend(format!(
                "llama-cli exited with code {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait::async_trait]
impl LlmProvider for LlamaCliProvider {
    fn name(&self) -> &str {
        "llama-cli"
    }

    fn default_model(&self) -> &str {
        &self.model_name
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let prompt = build_chatml_prompt(&request.messages);
        let n_predict = request.max_tokens.unwrap_or(self.config.max_tokens);

        let stdout = self.run(&prompt, n_predict).await?;
        let content = extract_completion(&stdout, &prompt);
        if content.is_empty() {
            return Err(Error::InvalidResponse("empty completion".to_string()));
        }

        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: self.model_name.clone(),
        })
    }
}
