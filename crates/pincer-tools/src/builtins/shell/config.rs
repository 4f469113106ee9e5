use serde::{Deserialize, Serialize};

/// Commands allowed when nothing is configured
pub const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["ls", "cat", "pwd", "echo", "date", "uname"];

/// Per-command hard cap, independent of the dispatcher budget
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Largest stdout/stderr returned to the caller
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4_000;

/// Shell tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Base command names that may run
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,
    /// Timeout for a single command
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Working directory (process cwd when unset)
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Output cap
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_allowed_commands() -> Vec<String> {
    DEFAULT_ALLOWED_COMMANDS.iter().map(|s| s.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            timeout_secs: default_timeout_secs(),
            working_dir: None,
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl ShellConfig {
    /// Replace the allowlist
    #[must_use]
    pub fn with_allowed_commands(mut self, commands: Vec<String>) -> Self {
        self.allowed_commands = commands;
        self
    }

    /// Set the per-command timeout
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}
