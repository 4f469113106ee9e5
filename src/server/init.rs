//! Component wiring and the `serve` run loop

use super::background_tasks::{start_cleanup_task, start_scheduler, CLEANUP_INTERVAL};
use super::config::{AccessMode, AppConfig};
use super::init_stores::open_memory;
use super::providers::resolve_llm_provider;
use anyhow::{Context, Result};
use pincer_channels::{TelegramAdapter, TelegramConfig, TelegramSink};
use pincer_core::{
    AllowList, JobSink, LogSink, Orchestrator, OrchestratorConfig, RateLimitConfig, SecurityGate,
};
use pincer_llm::LlmProvider;
use pincer_tools::builtins::{default_file_dirs, ShellConfig};
use pincer_tools::{register_builtins_with_config, BuiltinsConfig, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Security gate from `[security]`
pub fn build_gate(config: &AppConfig) -> Arc<SecurityGate> {
    let allowlist = match config.security.mode {
        AccessMode::Open => AllowList::Unrestricted,
        AccessMode::Allowlist => AllowList::only(
            config
                .security
                .allowed_users
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty()),
        ),
    };
    let rate_limit = RateLimitConfig::new(
        config.security.rate_limit.max_requests,
        Duration::from_secs(config.security.rate_limit.window_secs),
    );
    Arc::new(SecurityGate::new(allowlist, rate_limit))
}

/// Built-in tools with `[tools_config]` and per-tool overrides applied
pub fn build_registry(
    config: &AppConfig,
    provider: Option<Arc<dyn LlmProvider>>,
) -> Result<ToolRegistry> {
    let tools_config = &config.tools_config;
    let mut overrides = config.tools.clone();
    if provider.is_some() {
        // ask runs under the inference budget unless configured otherwise
        overrides
            .entry("ask".to_string())
            .or_default()
            .timeout_secs
            .get_or_insert(config.dispatcher.inference_timeout_secs);
    }

    let builtins = BuiltinsConfig {
        file_allowed_dirs: if tools_config.file_allowed_dirs.is_empty() {
            default_file_dirs()
        } else {
            tools_config.file_allowed_dirs.clone()
        },
        file_max_read_bytes: tools_config.file_max_read_bytes,
        shell: ShellConfig::default()
            .with_allowed_commands(tools_config.shell_allowed_commands.clone()),
        search_max_results: tools_config.search_max_results,
        ask_max_tokens: config.llm.max_tokens,
        tools: overrides,
    };

    let mut registry = ToolRegistry::new();
    register_builtins_with_config(&mut registry, &builtins, provider)
        .context("Failed to register tools")?;
    Ok(registry)
}

/// Orchestrator settings from the configuration
pub fn orchestrator_config(config: &AppConfig) -> OrchestratorConfig {
    let mut orch = OrchestratorConfig::new()
        .with_bot_name(config.bot_name.trim())
        .with_max_tokens(config.llm.max_tokens)
        .with_inference_timeout(Duration::from_secs(config.dispatcher.inference_timeout_secs))
        .with_default_tool_timeout(Duration::from_secs(config.dispatcher.default_timeout_secs))
        .with_history_limit(config.memory.history_limit)
        .with_semantic_top_k(config.memory.semantic_top_k);
    if !config.llm.system_prompt.trim().is_empty() {
        orch = orch.with_system_prompt(config.llm.system_prompt.trim());
    }
    orch
}

/// Wire every component the orchestrator needs
pub async fn build_orchestrator(config: &AppConfig) -> Result<Arc<Orchestrator>> {
    let provider = resolve_llm_provider(&config.llm)?;
    let registry = build_registry(config, provider.clone())?;

    let mut orchestrator = Orchestrator::new(
        build_gate(config),
        Arc::new(registry),
        orchestrator_config(config),
    )
    .context("Failed to build orchestrator")?;

    if let Some(provider) = provider {
        orchestrator = orchestrator.with_llm(provider);
    }
    if let Some(memory) = open_memory(&config.memory).await? {
        orchestrator = orchestrator.with_memory(memory);
    }

    Ok(Arc::new(orchestrator))
}

fn telegram_adapter(config: &AppConfig) -> Result<Option<Arc<TelegramAdapter>>> {
    if !config.channels.telegram.enabled {
        return Ok(None);
    }

    let token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
    let telegram = TelegramConfig::new(token)
        .with_groups_mention_only(config.channels.telegram.groups_mention_only)
        .validated()
        .context("Telegram is enabled but TELEGRAM_BOT_TOKEN is not usable")?;
    Ok(Some(Arc::new(TelegramAdapter::new(telegram))))
}

/// Run the bot until a shutdown signal arrives
pub async fn run(config: AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config).await?;
    let telegram = telegram_adapter(&config)?;
    let shutdown = CancellationToken::new();

    let mut tasks = vec![start_cleanup_task(
        &orchestrator,
        CLEANUP_INTERVAL,
        shutdown.child_token(),
    )];

    let sink: Arc<dyn JobSink> = match &telegram {
        Some(adapter) => Arc::new(TelegramSink::new(Arc::clone(adapter))),
        None => Arc::new(LogSink),
    };
    if let Some(handle) =
        start_scheduler(&config.scheduler, &orchestrator, sink, shutdown.child_token()).await?
    {
        tasks.push(handle);
    }

    match telegram {
        Some(adapter) => {
            let orchestrator = Arc::clone(&orchestrator);
            let shutdown = shutdown.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = adapter.run(orchestrator, shutdown.child_token()).await {
                    error!(error = %e, "Telegram channel failed");
                    shutdown.cancel();
                }
            }));
        }
        None if !config.scheduler.enabled => {
            warn!("No channel or scheduler enabled; use `pincer chat` for a local session");
        }
        None => {}
    }

    info!("Pincer is running. Press Ctrl+C to stop.");
    tokio::select! {
        _ = wait_for_shutdown_signal() => info!("Shutdown signal received"),
        _ = shutdown.cancelled() => warn!("Shutting down after a channel failure"),
    }
    shutdown.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "Background task ended abnormally");
        }
    }
    info!("Pincer stopped");
    Ok(())
}

/// Wait for Ctrl+C or, on unix, SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::LlmBackend;
    use pincer_core::UserId;
    use pincer_tools::ToolSettings;

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.backend = LlmBackend::None;
        config.memory.enabled = false;
        config
    }

    #[test]
    fn test_gate_from_allowlist_mode() {
        let mut config = offline_config();
        config.security.mode = AccessMode::Allowlist;
        config.security.allowed_users = vec!["42".to_string(), " ".to_string()];
        config.security.rate_limit.max_requests = 2;

        let gate = build_gate(&config);
        assert!(gate.is_allowlisted(&UserId::new("42")));
        assert!(!gate.is_allowlisted(&UserId::new("7")));
        assert_eq!(gate.usage(&UserId::new("42")), (0, 2));
    }

    #[test]
    fn test_registry_applies_overrides() {
        let mut config = offline_config();
        config.tools.insert(
            "calculator".to_string(),
            ToolSettings {
                aliases: vec!["math".to_string()],
                ..Default::default()
            },
        );

        let registry = build_registry(&config, None).unwrap();
        assert!(registry.get("calculator").is_some());
        assert!(!registry.get("shell").unwrap().spec.enabled);
        assert!(registry.get("ask").is_none());
        assert_eq!(
            registry
                .get("calculator")
                .unwrap()
                .spec
                .triggers
                .last()
                .map(|t| t.matcher.clone()),
            Some(pincer_tools::Matcher::Prefix("math".to_string()))
        );
    }

    #[test]
    fn test_registry_gives_ask_the_inference_budget() {
        let mut config = AppConfig::default();
        config.dispatcher.inference_timeout_secs = 45;
        let provider: Arc<dyn LlmProvider> = Arc::new(pincer_llm::MockProvider::new());

        let registry = build_registry(&config, Some(provider)).unwrap();
        assert_eq!(
            registry.get("ask").unwrap().spec.timeout,
            Some(Duration::from_secs(45))
        );
    }

    #[tokio::test]
    async fn test_orchestrator_answers_calculator() {
        let orchestrator = build_orchestrator(&offline_config()).await.unwrap();
        assert_eq!(
            orchestrator
                .handle_message(&UserId::new("local"), "calc 2+2")
                .await,
            "4"
        );
        assert!(orchestrator.inference_backend().is_none());
    }

    #[test]
    fn test_telegram_requires_token_when_enabled() {
        let config = offline_config();
        assert!(telegram_adapter(&config).unwrap().is_none());
    }
}
