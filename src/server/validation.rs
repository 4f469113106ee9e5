//! Startup configuration validation
//!
//! Contradictions are fatal; merely risky settings are logged.

use super::config::{AccessMode, AppConfig, LlmBackend};
use pincer_core::{Error, Result};
use std::collections::HashSet;
use tracing::warn;

const KNOWN_TOOLS: &[&str] = &["calculator", "file_manager", "shell", "web_search", "ask"];

/// Reject configurations that cannot work as written
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let security = &config.security;
    if security.rate_limit.max_requests == 0 {
        return Err(Error::Config(
            "security.rate_limit.max_requests must be at least 1".to_string(),
        ));
    }
    if security.rate_limit.window_secs == 0 {
        return Err(Error::Config(
            "security.rate_limit.window_secs must be at least 1".to_string(),
        ));
    }
    if security.mode == AccessMode::Allowlist
        && security.allowed_users.iter().all(|u| u.trim().is_empty())
    {
        return Err(Error::Config(
            "security.mode is \"allowlist\" but security.allowed_users is empty".to_string(),
        ));
    }

    if config.dispatcher.default_timeout_secs == 0 {
        return Err(Error::Config(
            "dispatcher.default_timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.dispatcher.inference_timeout_secs == 0 {
        return Err(Error::Config(
            "dispatcher.inference_timeout_secs must be at least 1".to_string(),
        ));
    }

    let mut names: Vec<&String> = config.tools.keys().collect();
    names.sort();
    for name in names {
        if !KNOWN_TOOLS.contains(&name.as_str()) {
            return Err(Error::Config(format!("override for unknown tool '{}'", name)));
        }
        if name == "ask" && config.llm.backend == LlmBackend::None {
            return Err(Error::Config(
                "tools.ask is configured but llm.backend is \"none\"".to_string(),
            ));
        }
        let settings = &config.tools[name];
        if settings.timeout_secs == Some(0) {
            return Err(Error::Config(format!("tools.{}.timeout_secs must be at least 1", name)));
        }
        if settings.aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(Error::Config(format!("tools.{} has an empty trigger", name)));
        }
    }

    if config.tools_config.search_max_results == 0 {
        return Err(Error::Config(
            "tools_config.search_max_results must be at least 1".to_string(),
        ));
    }

    if config.llm.backend == LlmBackend::Ollama && config.llm.ollama_url.trim().is_empty() {
        return Err(Error::Config(
            "llm.backend is \"ollama\" but llm.ollama_url is empty".to_string(),
        ));
    }

    if config.memory.enabled && config.memory.history_limit == 0 {
        return Err(Error::Config(
            "memory.history_limit must be at least 1 when memory is enabled".to_string(),
        ));
    }
    if config.memory.semantic_enabled && !config.memory.enabled {
        return Err(Error::Config(
            "memory.semantic_enabled requires memory.enabled".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for job in &config.scheduler.jobs {
        job.validate().map_err(|e| Error::Config(e.to_string()))?;
        if !seen.insert(job.name.as_str()) {
            return Err(Error::Config(format!("duplicate scheduler job '{}'", job.name)));
        }
    }

    warn_on_risky_settings(config);
    Ok(())
}

fn warn_on_risky_settings(config: &AppConfig) {
    if config.channels.telegram.enabled && config.security.mode == AccessMode::Open {
        warn!(
            "SECURITY WARNING: Telegram is enabled with an open allowlist. \
             Anyone who finds the bot can use it. Set ALLOWED_USER_IDS."
        );
    }

    if config.tools.get("shell").and_then(|s| s.enabled) == Some(true) {
        warn!(
            commands = ?config.tools_config.shell_allowed_commands,
            "Shell tool is enabled"
        );
    }

    if config.llm.backend == LlmBackend::Llama && config.llm.model_path.trim().is_empty() {
        warn!("llm.model_path is not set; conversation will be unavailable");
    }

    if config.scheduler.enabled && config.scheduler.jobs.is_empty() {
        warn!("Scheduler is enabled but no jobs are configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincer_core::ScheduledJob;
    use pincer_tools::ToolSettings;
    use std::time::Duration;

    fn assert_rejected(config: &AppConfig, fragment: &str) {
        match validate_config(config) {
            Err(Error::Config(msg)) => assert!(msg.contains(fragment), "{}", msg),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let mut config = AppConfig::default();
        config.security.rate_limit.max_requests = 0;
        assert_rejected(&config, "max_requests");
    }

    #[test]
    fn test_empty_allowlist_in_allowlist_mode_rejected() {
        let mut config = AppConfig::default();
        config.security.mode = AccessMode::Allowlist;
        assert_rejected(&config, "allowed_users");

        config.security.allowed_users = vec!["42".to_string()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_tool_override_rejected() {
        let mut config = AppConfig::default();
        config
            .tools
            .insert("teleport".to_string(), ToolSettings::default());
        assert_rejected(&config, "teleport");
    }

    #[test]
    fn test_empty_trigger_rejected() {
        let mut config = AppConfig::default();
        config.tools.insert(
            "calculator".to_string(),
            ToolSettings {
                aliases: vec!["  ".to_string()],
                ..Default::default()
            },
        );
        assert_rejected(&config, "empty trigger");
    }

    #[test]
    fn test_semantic_without_memory_rejected() {
        let mut config = AppConfig::default();
        config.memory.enabled = false;
        config.memory.semantic_enabled = true;
        assert_rejected(&config, "semantic_enabled");
    }

    #[test]
    fn test_scheduler_jobs_checked() {
        let mut config = AppConfig::default();
        config.scheduler.jobs = vec![
            ScheduledJob::new("news", Duration::from_secs(3600), "42", "search news"),
            ScheduledJob::new("news", Duration::from_secs(60), "42", "calc 1+1"),
        ];
        assert_rejected(&config, "duplicate scheduler job");

        config.scheduler.jobs = vec![ScheduledJob::new(
            "tight",
            Duration::from_millis(10),
            "42",
            "calc 1+1",
        )];
        assert_rejected(&config, "tight");

        config.scheduler.jobs = vec![ScheduledJob::new(
            "never",
            Duration::from_secs(u64::MAX),
            "42",
            "calc 1+1",
        )];
        assert_rejected(&config, "never");

        config.scheduler.jobs = vec![ScheduledJob::cron("leap", "0 0 30 2 *", "42", "calc 1+1")];
        assert_rejected(&config, "leap");

        config.scheduler.jobs = vec![ScheduledJob::cron("weekdays", "0 8 * * 1-5", "42", "calc 1+1")];
        assert!(validate_config(&config).is_ok());
    }
}
