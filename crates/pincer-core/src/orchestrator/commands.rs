//! Bot commands (`/start`, `/help`, `/status`, `/reset`)

use pincer_tools::ToolSpec;

/// A recognized slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Welcome message plus help
    Start,
    /// Command and tool overview
    Help,
    /// Enabled tools, inference backend, memory and rate usage
    Status,
    /// Clear the caller's conversation history
    Reset,
    /// Looks like a command but is not one we know
    Unknown(String),
}

impl BotCommand {
    /// Parse a message as a command.
    ///
    /// Returns `None` unless the first word is `/name` or `/name@botname`
    /// with a name made of ASCII letters, digits and underscores, so paths
    /// such as `/etc/hosts` fall through to the planner.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().split_whitespace().next()?;
        let body = word.strip_prefix('/')?;
        let name = body.split_once('@').map_or(body, |(name, _)| name);
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "status" => Self::Status,
            "reset" | "clear" => Self::Reset,
            other => Self::Unknown(other.to_string()),
        })
    }
}

pub(crate) fn help_text(bot_name: &str, tools: &[&ToolSpec]) -> String {
    let mut text = format!(
        "{bot_name} - local assistant\n\n\
         Commands:\n  \
         /start - Welcome message\n  \
         /help - Show this help\n  \
         /reset - Clear your conversation history\n  \
         /status - Show bot and model status\n\n\
         Just send any message to chat."
    );

    let usages: Vec<&str> = tools
        .iter()
        .map(|t| t.usage.as_str())
        .filter(|u| !u.is_empty())
        .collect();
    if !usages.is_empty() {
        text.push_str("\n\nTools:\n");
        text.push_str(
            &usages
                .iter()
                .map(|u| format!("  {}", u))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    text
}

pub(crate) fn welcome_text(bot_name: &str, tools: &[&ToolSpec]) -> String {
    format!(
        "Hello! I'm {}, your local assistant.\n\n{}",
        bot_name,
        help_text(bot_name, tools)
    )
}

pub(crate) struct StatusReport<'a> {
    pub bot_name: &'a str,
    pub tools: Vec<&'a ToolSpec>,
    pub inference: Option<(&'a str, &'a str)>,
    pub memory: &'static str,
    pub usage: (u32, u32),
}

impl StatusReport<'_> {
    pub(crate) fn render(&self) -> String {
        let tools = if self.tools.is_empty() {
            "  none enabled".to_string()
        } else {
            self.tools
                .iter()
                .map(|t| format!("  - {}: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let inference = match self.inference {
            Some((backend, model)) => format!("{} ({})", backend, model),
            None => "not configured".to_string(),
        };

        format!(
            "{} status\n\nModel: {}\nMemory: {}\nRequests in current window: {}/{}\n\nAvailable tools:\n{}",
            self.bot_name, inference, self.memory, self.usage.0, self.usage.1, tools
        )
    }
}
