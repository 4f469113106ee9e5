//! Interactive terminal chat
//!
//! Every line goes through the same gate, planner and dispatcher as a
//! Telegram message, so it is the quickest way to try a configuration.

use crate::server::config::{AccessMode, AppConfig};
use anyhow::Result;
use pincer_core::{Orchestrator, UserId};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const QUIT_COMMANDS: &[&str] = &["/quit", "/exit"];

/// Start a session on stdin/stdout
pub async fn run(config: AppConfig, user: Option<String>) -> Result<()> {
    let user = UserId::new(local_identity(&config, user));
    let orchestrator = crate::server::build_orchestrator(&config).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "{} chat. Type /help for commands, /quit to leave.\n",
        orchestrator.config().bot_name
    )?;

    run_session(&orchestrator, &user, stdin, &mut stdout).await
}

/// The identity used for a terminal session.
///
/// With an allowlist the first listed user is borrowed, so the session is
/// not rejected outright.
fn local_identity(config: &AppConfig, requested: Option<String>) -> String {
    if let Some(user) = requested.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
        return user;
    }
    match config.security.mode {
        AccessMode::Allowlist => config
            .security
            .allowed_users
            .iter()
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
            .unwrap_or("local")
            .to_string(),
        AccessMode::Open => "local".to_string(),
    }
}

async fn run_session<R, W>(
    orchestrator: &Orchestrator,
    user: &UserId,
    input: R,
    output: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let bot_name = orchestrator.config().bot_name.clone();
    let mut lines = input.lines();

    loop {
        write!(output, "You: ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        let reply = orchestrator.handle_message(user, line).await;
        writeln!(output, "\n{}: {}\n", bot_name, reply)?;
    }

    writeln!(output, "Goodbye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincer_core::{AllowList, OrchestratorConfig, RateLimitConfig, SecurityGate};
    use pincer_tools::{register_builtins, ToolRegistry};
    use std::sync::Arc;
    use std::time::Duration;

    fn orchestrator() -> Orchestrator {
        let gate = Arc::new(SecurityGate::new(
            AllowList::Unrestricted,
            RateLimitConfig::new(10, Duration::from_secs(60)),
        ));
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry, None).unwrap();
        Orchestrator::new(gate, Arc::new(registry), OrchestratorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_session_answers_until_quit() {
        let orch = orchestrator();
        let mut output = Vec::new();
        run_session(
            &orch,
            &UserId::new("local"),
            &b"calc 2+2\n\n/QUIT\ncalc 3+3\n"[..],
            &mut output,
        )
        .await
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Pincer: 4"));
        assert!(!text.contains("Pincer: 6"));
        assert!(text.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_session_ends_on_eof() {
        let orch = orchestrator();
        let mut output = Vec::new();
        run_session(&orch, &UserId::new("local"), &b"calc 10/4"[..], &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Pincer: 2.5"));
        assert!(text.contains("Goodbye!"));
    }

    #[test]
    fn test_local_identity() {
        let mut config = AppConfig::default();
        assert_eq!(local_identity(&config, None), "local");
        assert_eq!(local_identity(&config, Some(" 7 ".to_string())), "7");

        config.security.mode = AccessMode::Allowlist;
        config.security.allowed_users = vec!["42".to_string(), "43".to_string()];
        assert_eq!(local_identity(&config, None), "42");
    }
}
