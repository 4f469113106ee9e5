//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::{AccessMode, AppConfig};
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("PINCER_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables: PINCER_LLM__MODEL_PATH and friends
        .add_source(
            Environment::with_prefix("PINCER")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("security.allowed_users")
                .with_list_parse_key("tools_config.shell_allowed_commands")
                .with_list_parse_key("tools_config.file_allowed_dirs")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_legacy_env(&mut app, |key| std::env::var(key).ok());
    Ok(app)
}

/// Parse only the embedded defaults
pub fn default_config() -> Result<AppConfig> {
    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Unprefixed variables from older `.env` files win over everything else.
pub(crate) fn apply_legacy_env<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if get("TELEGRAM_BOT_TOKEN").is_some() {
        config.channels.telegram.enabled = true;
    }

    if let Some(ids) = get("ALLOWED_USER_IDS") {
        let ids: Vec<String> = ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !ids.is_empty() {
            config.security.mode = AccessMode::Allowlist;
            config.security.allowed_users = ids;
        }
    }

    if let Some(rpm) = get("RATE_LIMIT_RPM").and_then(|v| v.parse().ok()) {
        config.security.rate_limit.max_requests = rpm;
        config.security.rate_limit.window_secs = 60;
    }

    if let Some(path) = get("LLAMA_MODEL_PATH") {
        config.llm.model_path = path;
    }

    if let Some(binary) = get("LLAMA_BINARY") {
        config.llm.binary = binary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::{LlmBackend, LogFormat};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config = default_config().unwrap();
        assert_eq!(config.bot_name, "Pincer");
        assert_eq!(config.security.mode, AccessMode::Open);
        assert_eq!(config.security.rate_limit.max_requests, 10);
        assert_eq!(config.security.rate_limit.window_secs, 60);
        assert_eq!(config.dispatcher.default_timeout_secs, 10);
        assert_eq!(config.llm.backend, LlmBackend::Llama);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.channels.telegram.enabled);
        assert!(config.scheduler.jobs.is_empty());
        assert_eq!(config.tools["shell"].enabled, Some(false));
    }

    #[test]
    fn test_legacy_allowlist_and_rate_limit() {
        let mut config = default_config().unwrap();
        apply_legacy_env(
            &mut config,
            env(&[("ALLOWED_USER_IDS", " 42, 7 ,"), ("RATE_LIMIT_RPM", "3")]),
        );
        assert_eq!(config.security.mode, AccessMode::Allowlist);
        assert_eq!(config.security.allowed_users, vec!["42", "7"]);
        assert_eq!(config.security.rate_limit.max_requests, 3);
    }

    #[test]
    fn test_legacy_blank_values_are_ignored() {
        let mut config = default_config().unwrap();
        apply_legacy_env(
            &mut config,
            env(&[("ALLOWED_USER_IDS", "  "), ("TELEGRAM_BOT_TOKEN", "")]),
        );
        assert_eq!(config.security.mode, AccessMode::Open);
        assert!(!config.channels.telegram.enabled);
    }

    #[test]
    fn test_legacy_llama_and_telegram() {
        let mut config = default_config().unwrap();
        apply_legacy_env(
            &mut config,
            env(&[
                ("LLAMA_MODEL_PATH", "/models/phi.gguf"),
                ("LLAMA_BINARY", "/opt/llama/llama-cli"),
                ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ]),
        );
        assert_eq!(config.llm.model_path, "/models/phi.gguf");
        assert_eq!(config.llm.binary, "/opt/llama/llama-cli");
        assert!(config.channels.telegram.enabled);
    }
}
