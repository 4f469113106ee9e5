use std::path::PathBuf;
use std::time::Duration;

/// Default llama.cpp CLI binary name
pub const DEFAULT_BINARY: &str = "llama-cli";

/// llama-cli backend configuration
#[derive(Debug, Clone)]
pub struct LlamaConfig {
    /// Path or name of the llama-cli executable
    pub binary: String,
    /// GGUF model file
    pub model_path: Option<PathBuf>,
    /// CPU threads
    pub threads: u32,
    /// Tokens to generate when the request does not say
    pub max_tokens: u32,
    /// Context window in tokens
    pub ctx_size: u32,
    /// Layers offloaded to the GPU (0 = CPU only)
    pub gpu_layers: u32,
    /// Hard cap on one inference run
    pub timeout: Duration,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            model_path: None,
            threads: 4,
            max_tokens: 512,
            ctx_size: 2048,
            gpu_layers: 0,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LlamaConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from `LLAMA_*` environment variables
    pub fn from_env() -> Self {
        fn num(var: &str, default: u32) -> u32 {
            std::env::var(var)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        }

        let defaults = Self::default();
        Self {
            binary: std::env::var("LLAMA_BINARY").unwrap_or(defaults.binary),
            model_path: std::env::var("LLAMA_MODEL_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            threads: num("LLAMA_THREADS", defaults.threads),
            max_tokens: num("LLAMA_MAX_TOKENS", defaults.max_tokens),
            ctx_size: num("LLAMA_CTX_SIZE", defaults.ctx_size),
            gpu_layers: num("LLAMA_GPU_LAYERS", defaults.gpu_layers),
            timeout: defaults.timeout,
        }
    }

    /// Set the binary
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the model path
    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the thread count
    #[must_use]
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Set the default max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the context size
    #[must_use]
    pub fn with_ctx_size(mut self, ctx_size: u32) -> Self {
        self.ctx_size = ctx_size;
        self
    }

    /// Set GPU layers
    #[must_use]
    pub fn with_gpu_layers(mut self, gpu_layers: u32) -> Self {
        self.gpu_layers = gpu_layers;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
