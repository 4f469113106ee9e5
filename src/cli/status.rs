//! `pincer status`: effective configuration at a glance

use crate::server::config::{AccessMode, AppConfig, LlmBackend};
use anyhow::{Context, Result};
use pincer_tools::ToolRegistry;
use std::fmt::Write as _;
use std::path::Path;

/// Print the report, or the merged configuration, to stdout
pub fn run(config: &AppConfig, show_config: bool) -> Result<()> {
    if show_config {
        print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
        return Ok(());
    }

    let provider = crate::server::resolve_llm_provider(&config.llm)?;
    let registry = crate::server::build_registry(config, provider)?;
    print!("{}", render(config, &registry));
    Ok(())
}

fn render(config: &AppConfig, registry: &ToolRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} v{}", config.bot_name, env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out);

    let access = match config.security.mode {
        AccessMode::Open => "open to everyone".to_string(),
        AccessMode::Allowlist => format!("allowlist ({} users)", config.security.allowed_users.len()),
    };
    let _ = writeln!(out, "Access:     {}", access);
    let _ = writeln!(
        out,
        "Rate limit: {} requests per {}s",
        config.security.rate_limit.max_requests, config.security.rate_limit.window_secs
    );

    let _ = writeln!(out, "Inference:  {}", inference_line(config));

    let memory = if config.memory.enabled {
        format!(
            "sqlite at {}{}",
            config.memory.database_path().display(),
            if config.memory.semantic_enabled { " (semantic recall on)" } else { "" }
        )
    } else {
        "disabled".to_string()
    };
    let _ = writeln!(out, "Memory:     {}", memory);
    let _ = writeln!(
        out,
        "Telegram:   {}",
        if config.channels.telegram.enabled { "enabled" } else { "disabled" }
    );
    let _ = writeln!(
        out,
        "Scheduler:  {}",
        if config.scheduler.enabled {
            format!("{} jobs", config.scheduler.jobs.len())
        } else {
            "disabled".to_string()
        }
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Tools:");
    for spec in registry.list() {
        let _ = writeln!(
            out,
            "  [{}] {:<13} {} (risk: {})",
            if spec.enabled { "x" } else { " " },
            spec.name,
            spec.description,
            spec.risk_level.as_str()
        );
    }
    out
}

fn inference_line(config: &AppConfig) -> String {
    let llm = &config.llm;
    match llm.backend {
        LlmBackend::None => "disabled".to_string(),
        LlmBackend::Ollama => format!("ollama {} at {}", llm.model, llm.ollama_url),
        LlmBackend::Llama => {
            let model = llm.model_path.trim();
            if model.is_empty() {
                format!("{} (no model configured)", llm.binary)
            } else if Path::new(model).exists() {
                format!("{} with {}", llm.binary, model)
            } else {
                format!("{} with {} (file not found)", llm.binary, model)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_tools_and_backend() {
        let mut config = AppConfig::default();
        config.llm.backend = LlmBackend::None;
        config.memory.enabled = false;
        let registry = crate::server::build_registry(&config, None).unwrap();

        let report = render(&config, &registry);
        assert!(report.starts_with("Pincer v"));
        assert!(report.contains("Access:     open to everyone"));
        assert!(report.contains("Rate limit: 10 requests per 60s"));
        assert!(report.contains("Inference:  disabled"));
        assert!(report.contains("Memory:     disabled"));
        assert!(report.contains("[x] calculator"));
        assert!(report.contains("[ ] shell"));
    }

    #[test]
    fn test_config_dump_round_trips() {
        let mut config = AppConfig::default();
        config.scheduler.jobs.push(pincer_core::ScheduledJob::new(
            "digest",
            std::time::Duration::from_secs(3600),
            "42",
            "search rust news",
        ));

        let dumped = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed.scheduler.jobs, config.scheduler.jobs);
        assert_eq!(parsed.security.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_missing_model_file_is_flagged() {
        let mut config = AppConfig::default();
        config.llm.model_path = "/nonexistent/model.gguf".to_string();
        assert!(inference_line(&config).ends_with("(file not found)"));

        config.llm.model_path = String::new();
        assert!(inference_line(&config).contains("no model configured"));
    }
}
