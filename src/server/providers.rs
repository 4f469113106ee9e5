//! Inference provider resolution

use super::config::{LlmBackend, LlmConfig};
use anyhow::{Context, Result};
use pincer_llm::{LlamaCliProvider, LlamaConfig, LlmProvider, OllamaConfig, OllamaProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the configured backend, or `None` when inference is switched off.
///
/// A llama backend without a model path is still returned: it fails each
/// call with a not-configured error, which the orchestrator turns into an
/// apology.
pub fn resolve_llm_provider(config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));

    match config.backend {
        LlmBackend::None => {
            info!("Inference disabled (llm.backend = \"none\")");
            Ok(None)
        }
        LlmBackend::Llama => {
            let mut llama = LlamaConfig::new()
                .with_binary(config.binary.trim())
                .with_threads(config.threads)
                .with_max_tokens(config.max_tokens)
                .with_ctx_size(config.ctx_size)
                .with_gpu_layers(config.gpu_layers)
                .with_timeout(timeout);
            let model_path = config.model_path.trim();
            if model_path.is_empty() {
                warn!("No model configured; set LLAMA_MODEL_PATH or llm.model_path");
            } else {
                llama = llama.with_model_path(model_path);
            }

            let provider = LlamaCliProvider::new(llama);
            info!(binary = %config.binary, model = %provider.default_model(), "Using llama-cli backend");
            Ok(Some(Arc::new(provider)))
        }
        LlmBackend::Ollama => {
            let ollama = OllamaConfig::new()
                .with_base_url(config.ollama_url.trim())
                .with_model(config.model.trim())
                .with_max_tokens(config.max_tokens)
                .with_timeout(timeout);
            let provider =
                OllamaProvider::new(ollama).context("Failed to create Ollama provider")?;
            info!(url = %config.ollama_url, model = %config.model, "Using Ollama backend");
            Ok(Some(Arc::new(provider)))
        }
    }
}
