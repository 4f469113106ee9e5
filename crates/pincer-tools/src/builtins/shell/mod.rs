//! Shell tool - allowlisted command execution
//!
//! Disabled by default. Commands run directly (no `sh -c`), so only the
//! program name needs checking once metacharacters are rejected.

mod config;
mod security;


pub use config::{ShellConfig, DEFAULT_ALLOWED_COMMANDS};

use security::parse_command;

use crate::error::{Error, Result};
use crate::registry::{
    str_arg, ParamKind, ParamSpec, RiskLevel, Tool, ToolCategory, ToolOutput, ToolSpec, Trigger,
};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

const SHELL_PATTERN: &str = r"(?is)^(?:run|exec(?:ute)?|shell)\s*:\s*(?P<args>.*)$";

/// Shell tool
pub struct ShellTool {
    spec: ToolSpec,
    config: ShellConfig,
}

impl ShellTool {
    /// Create a new shell tool
    #[must_use]
    pub fn new(config: ShellConfig) -> Self {
        let spec = ToolSpec::new("shell", "Run an allowlisted command and return its output")
            .with_usage(format!(
                "run: <command>, allowed: {}",
                config.allowed_commands.join(", ")
            ))
            .with_category(ToolCategory::Exec)
            .with_risk_level(RiskLevel::High)
            .with_enabled(false)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_param(ParamSpec::required("command", ParamKind::String))
            .with_trigger(Trigger::pattern(SHELL_PATTERN));

        Self { spec, config }
    }

    async fn run_command(&self, program: &str, args: &[String]) -> Result<ToolOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        info!(program = %program, args = ?args, "Executing shell command");

        let child = cmd
            .spawn()
            .map_err(|e| Error::Execution(format!("failed to start '{}': {}", program, e)))?;

        let output = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.timeout_secs * 1000))?
        .map_err(|e| Error::Execution(e.to_string()))?;

        let cap = self.config.max_output_bytes;
        let stdout = truncate_output(&String::from_utf8_lossy(&output.stdout), cap);
        let stderr = truncate_output(&String::from_utf8_lossy(&output.stderr), cap);
        let exit_code = output.status.code().unwrap_or(-1);

        let text = if output.status.success() {
            if stdout.trim().is_empty() {
                "(no output)".to_string()
            } else {
                stdout.trim_end().to_string()
            }
        } else {
            warn!(program = %program, exit_code, "Shell command failed");
            let detail = if stderr.trim().is_empty() {
                stdout.trim_end()
            } else {
                stderr.trim_end()
            };
            format!("Command exited with code {}\n{}", exit_code, detail)
                .trim_end()
                .to_string()
        };

        Ok(ToolOutput::text(text).with_data(serde_json::json!({
            "exit_code": exit_code,
            "success": output.status.success(),
        })))
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[async_trait::async_trait]
impl Tool for ShellTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let line = str_arg(&input, "command")?;
        let (program, args) = parse_command(&self.config, line)?;
        self.run_command(&program, &args).await
    }
}

fn truncate_output(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n...[truncated]", &s[..end])
}
