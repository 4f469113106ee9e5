use super::config::ShellConfig;
use crate::error::{Error, Result};

/// Shell metacharacters that indicate command injection attempts
pub const SHELL_METACHARACTERS: &[char] = &[
    '|', ';', '&', '$', '`', '(', ')', '<', '>', '\n', '\r', '!', '#', '*', '?', '{', '}',
];

/// Return the first shell metacharacter in `s`, if any
#[must_use]
pub fn contains_shell_metacharacters(s: &str) -> Option<char> {
    s.chars().find(|c| SHELL_METACHARACTERS.contains(c))
}

/// Base name of a command (`/bin/ls` -> `ls`)
#[must_use]
pub fn base_command(command: &str) -> &str {
    command.rsplit('/').next().unwrap_or(command)
}

/// Split a command line into program and arguments after checking it
/// against the allowlist.
pub fn parse_command(config: &ShellConfig, line: &str) -> Result<(String, Vec<String>)> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::InvalidInput("missing 'command' parameter".to_string()));
    }

    if let Some(c) = contains_shell_metacharacters(line) {
        return Err(Error::PermissionDenied(format!(
            "shell metacharacter '{}' is not allowed",
            c.escape_default()
        )));
    }

    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next().unwrap_or_default();
    let base = base_command(&program);

    if !config.allowed_commands.iter().any(|a| a == base) {
        return Err(Error::PermissionDenied(format!(
            "command '{}' is not allowed",
            base
        )));
    }

    Ok((program, parts.collect()))
}
