//! Application configuration types
//!
//! Mirrors `config/default.toml`. Every section has defaults so a partial
//! override file or a handful of `PINCER_*` variables is enough.

use pincer_core::ScheduledJob;
use pincer_tools::ToolSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub dispatcher: DispatcherAppConfig,
    /// Per-tool overrides keyed by tool name
    #[serde(default)]
    pub tools: HashMap<String, ToolSettings>,
    #[serde(default)]
    pub tools_config: ToolsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub scheduler: SchedulerAppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_bot_name() -> String {
    pincer_core::orchestrator::DEFAULT_BOT_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            security: SecurityConfig::default(),
            dispatcher: DispatcherAppConfig::default(),
            tools: HashMap::new(),
            tools_config: ToolsConfig::default(),
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            channels: ChannelsConfig::default(),
            scheduler: SchedulerAppConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Who may talk to the bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Everyone passes the allowlist check
    #[default]
    Open,
    /// Only `allowed_users` pass
    Allowlist,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub mode: AccessMode,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitAppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitAppConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitAppConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherAppConfig {
    #[serde(default = "default_tool_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
}

fn default_tool_timeout_secs() -> u64 {
    10
}

fn default_inference_timeout_secs() -> u64 {
    120
}

impl Default for DispatcherAppConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_tool_timeout_secs(),
            inference_timeout_secs: default_inference_timeout_secs(),
        }
    }
}

/// Settings handed to the built-in tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Empty means `/tmp` plus the data directory
    #[serde(default)]
    pub file_allowed_dirs: Vec<PathBuf>,
    #[serde(default = "default_file_max_read_bytes")]
    pub file_max_read_bytes: usize,
    #[serde(default = "default_shell_commands")]
    pub shell_allowed_commands: Vec<String>,
    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,
}

fn default_file_max_read_bytes() -> usize {
    pincer_tools::builtins::DEFAULT_MAX_READ_BYTES
}

fn default_shell_commands() -> Vec<String> {
    pincer_tools::builtins::DEFAULT_ALLOWED_COMMANDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_search_max_results() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            file_allowed_dirs: Vec::new(),
            file_max_read_bytes: default_file_max_read_bytes(),
            shell_allowed_commands: default_shell_commands(),
            search_max_results: default_search_max_results(),
        }
    }
}

/// Inference backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// llama.cpp CLI subprocess
    #[default]
    Llama,
    /// Ollama HTTP daemon
    Ollama,
    /// No model; conversation falls back to an apology
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub backend: LlmBackend,
    #[serde(default = "default_llama_binary")]
    pub binary: String,
    /// Blank means not configured
    #[serde(default)]
    pub model_path: String,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_ctx_size")]
    pub ctx_size: u32,
    #[serde(default)]
    pub gpu_layers: u32,
    #[serde(default = "default_inference_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    /// Blank keeps the built-in prompt
    #[serde(default)]
    pub system_prompt: String,
}

fn default_llama_binary() -> String {
    pincer_llm::llama::DEFAULT_BINARY.to_string()
}

fn default_threads() -> u32 {
    4
}

fn default_max_tokens() -> u32 {
    512
}

fn default_ctx_size() -> u32 {
    2048
}

fn default_ollama_url() -> String {
    pincer_llm::ollama::DEFAULT_BASE_URL.to_string()
}

fn default_ollama_model() -> String {
    pincer_llm::ollama::DEFAULT_MODEL.to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            binary: default_llama_binary(),
            model_path: String::new(),
            threads: default_threads(),
            max_tokens: default_max_tokens(),
            ctx_size: default_ctx_size(),
            gpu_layers: 0,
            timeout_secs: default_inference_timeout_secs(),
            ollama_url: default_ollama_url(),
            model: default_ollama_model(),
            system_prompt: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Blank means `<data dir>/pincer/pincer.db`
    #[serde(default)]
    pub sqlite_path: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub semantic_enabled: bool,
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    20
}

fn default_semantic_top_k() -> usize {
    3
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sqlite_path: String::new(),
            history_limit: default_history_limit(),
            semantic_enabled: false,
            semantic_top_k: default_semantic_top_k(),
        }
    }
}

impl MemoryConfig {
    /// Resolved database location
    pub fn database_path(&self) -> PathBuf {
        if self.sqlite_path.trim().is_empty() {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("data"))
                .join("pincer")
                .join("pincer.db")
        } else {
            PathBuf::from(self.sqlite_path.trim())
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramAppConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub groups_mention_only: bool,
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            groups_mention_only: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerAppConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub jobs: Vec<ScheduledJob>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Daily-rolling log file; blank logs to stderr only
    #[serde(default)]
    pub file: String,
}
