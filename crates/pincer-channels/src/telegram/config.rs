//! Telegram configuration

use crate::error::{Error, Result};

/// Telegram bot configuration
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// In groups, only answer messages that mention or reply to the bot
    pub groups_mention_only: bool,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("groups_mention_only", &self.groups_mention_only)
            .finish()
    }
}

impl TelegramConfig {
    /// Create from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_GROUPS_MENTION_ONLY`
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| Error::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let groups_mention_only = std::env::var("TELEGRAM_GROUPS_MENTION_ONLY")
            .map(|s| s == "true" || s == "1")
            .unwrap_or(true);

        Self::new(bot_token)
            .with_groups_mention_only(groups_mention_only)
            .validated()
    }

    /// Create with a bot token
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into().trim().to_string(),
            groups_mention_only: true,
        }
    }

    /// Set groups mention only mode
    #[must_use]
    pub fn with_groups_mention_only(mut self, enabled: bool) -> Self {
        self.groups_mention_only = enabled;
        self
    }

    /// Reject an empty token
    pub fn validated(self) -> Result<Self> {
        if self.bot_token.is_empty() {
            return Err(Error::Config("Telegram bot token is empty".to_string()));
        }
        Ok(self)
    }
}
