//! Built-in tools
//!
//! - calculator: arithmetic evaluation
//! - file_manager: sandboxed read/write
//! - shell: allowlisted command execution (disabled by default)
//! - web_search: DuckDuckGo search
//! - ask: one-off question to the local model

mod ask;
mod calculator;
mod file;
mod shell;
mod web_search;

pub use ask::{AskTool, INFERENCE_TOOL_TIMEOUT};
pub use calculator::{evaluate, format_number, CalculatorTool};
pub use file::{is_sensitive_file, FileManagerTool, FileSandbox, DEFAULT_MAX_READ_BYTES};
pub use shell::{ShellConfig, ShellTool, DEFAULT_ALLOWED_COMMANDS};
pub use web_search::{format_results, parse_search_results, SearchResult, WebSearchTool};

use crate::error::{Error, Result};
use crate::registry::{ToolRegistry, ToolSettings};
use pincer_llm::LlmProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the built-in tools
#[derive(Debug, Clone)]
pub struct BuiltinsConfig {
    /// Directories the file manager may touch
    pub file_allowed_dirs: Vec<PathBuf>,
    /// File manager read cap
    pub file_max_read_bytes: usize,
    /// Shell settings
    pub shell: ShellConfig,
    /// Number of search results
    pub search_max_results: usize,
    /// Token budget for the ask tool
    pub ask_max_tokens: u32,
    /// Per-tool overrides keyed by tool name
    pub tools: HashMap<String, ToolSettings>,
}

impl Default for BuiltinsConfig {
    fn default() -> Self {
        Self {
            file_allowed_dirs: default_file_dirs(),
            file_max_read_bytes: DEFAULT_MAX_READ_BYTES,
            shell: ShellConfig::default(),
            search_max_results: web_search::DEFAULT_MAX_RESULTS,
            ask_max_tokens: 512,
            tools: HashMap::new(),
        }
    }
}

/// `/tmp` plus the platform data directory
#[must_use]
pub fn default_file_dirs() -> Vec<PathBuf> {
    let mut allowed = vec![std::env::temp_dir()];
    if let Some(data) = dirs::data_dir() {
        allowed.push(data.join("pincer").join("files"));
    }
    allowed
}

/// Register all built-in tools with default configuration
pub fn register_builtins(
    registry: &mut ToolRegistry,
    provider: Option<Arc<dyn LlmProvider>>,
) -> Result<()> {
    register_builtins_with_config(registry, &BuiltinsConfig::default(), provider)
}

/// Register all built-in tools in their fixed order.
///
/// The ask tool is only registered when an inference provider is given.
/// Settings for a tool name that was never registered are a configuration
/// error.
pub fn register_builtins_with_config(
    registry: &mut ToolRegistry,
    config: &BuiltinsConfig,
    provider: Option<Arc<dyn LlmProvider>>,
) -> Result<()> {
    let settings = |name: &str| config.tools.get(name).cloned().unwrap_or_default();

    registry.register_with(Arc::new(CalculatorTool::new()), &settings("calculator"))?;

    let sandbox = FileSandbox::new(config.file_allowed_dirs.clone())
        .with_max_read_bytes(config.file_max_read_bytes);
    registry.register_with(
        Arc::new(FileManagerTool::new(sandbox)),
        &settings("file_manager"),
    )?;

    registry.register_with(
        Arc::new(ShellTool::new(config.shell.clone())),
        &settings("shell"),
    )?;

    registry.register_with(
        Arc::new(WebSearchTool::new(config.search_max_results)?),
        &settings("web_search"),
    )?;

    if let Some(provider) = provider {
        registry.register_with(
            Arc::new(AskTool::new(provider, config.ask_max_tokens)),
            &settings("ask"),
        )?;
    }

    let mut unknown: Vec<&String> = config
        .tools
        .keys()
        .filter(|name| !registry.has(name))
        .collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(Error::NotFound((*name).clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincer_llm::MockProvider;

    #[test]
    fn test_register_builtins_order() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, Some(Arc::new(MockProvider::new()))).unwrap();

        let names: Vec<_> = registry.list().iter().map(|s| s.name.clone()).collect();
        assert_eq!(
            names,
            vec!["calculator", "file_manager", "shell", "web_search", "ask"]
        );
    }

    #[test]
    fn test_shell_disabled_by_default() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, None).unwrap();

        assert!(!registry.get("shell").unwrap().spec.enabled);
        assert!(registry.list_enabled().iter().all(|s| s.name != "shell"));
        assert!(!registry.has("ask"));
    }

    #[test]
    fn test_settings_enable_shell() {
        let mut config = BuiltinsConfig::default();
        config.tools.insert(
            "shell".to_string(),
            ToolSettings {
                enabled: Some(true),
                ..Default::default()
            },
        );
        let mut registry = ToolRegistry::new();
        register_builtins_with_config(&mut registry, &config, None).unwrap();

        assert!(registry.get("shell").unwrap().spec.enabled);
    }

    #[test]
    fn test_unknown_tool_settings_rejected() {
        let mut config = BuiltinsConfig::default();
        config
            .tools
            .insert("teleport".to_string(), ToolSettings::default());
        let mut registry = ToolRegistry::new();

        let err = register_builtins_with_config(&mut registry, &config, None).unwrap_err();
        assert!(matches!(err, Error::NotFound(name) if name == "teleport"));
    }

    #[test]
    fn test_double_registration_is_duplicate() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, None).unwrap();
        let err = register_builtins(&mut registry, None).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(_)));
    }
}
