//! Telegram adapter core

use super::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::util::{markdown_to_html, split_message, TELEGRAM_MESSAGE_LIMIT};
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{Message as TelegramMessage, MessageId, ParseMode, ReplyParameters},
};
use tracing::{debug, warn};

/// Telegram bot adapter
pub struct TelegramAdapter {
    pub(crate) bot: Bot,
    pub(crate) config: TelegramConfig,
}

impl TelegramAdapter {
    /// Create a new Telegram adapter
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        let bot = Bot::new(&config.bot_token);
        Self { bot, config }
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(TelegramConfig::from_env()?))
    }

    /// Get the underlying bot
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Text the orchestrator should see, or `None` to ignore the message.
    ///
    /// Non-text messages are ignored. In groups with mention-only mode the
    /// bot answers only when mentioned or replied to, and the mention is
    /// stripped.
    pub(crate) fn inbound_text(&self, msg: &TelegramMessage, bot_username: &str) -> Option<String> {
        let text = msg.text()?;
        let is_group = msg.chat.is_group() || msg.chat.is_supergroup();
        let is_reply_to_bot = msg
            .reply_to_message()
            .and_then(|r| r.from.as_ref())
            .map(|u| !bot_username.is_empty() && u.username.as_deref() == Some(bot_username))
            .unwrap_or(false);

        select_text(
            text,
            is_group && self.config.groups_mention_only,
            is_reply_to_bot,
            bot_username,
        )
    }

    /// Send a reply, split to Telegram's size limit.
    ///
    /// Each chunk is tried as HTML first and resent as plain text if
    /// Telegram rejects the markup.
    pub async fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        text: &str,
    ) -> Result<()> {
        for (i, chunk) in split_message(text, TELEGRAM_MESSAGE_LIMIT)
            .iter()
            .enumerate()
        {
            let reply_to = reply_to.filter(|_| i == 0);

            let mut html = self
                .bot
                .send_message(chat_id, markdown_to_html(chunk))
                .parse_mode(ParseMode::Html);
            if let Some(id) = reply_to {
                html = html.reply_parameters(ReplyParameters::new(id));
            }

            match html.await {
                Ok(sent) => debug!(chat_id = %chat_id, message_id = %sent.id, "Sent reply (HTML)"),
                Err(e) => {
                    warn!(chat_id = %chat_id, error = %e, "HTML send failed, falling back to plain text");
                    let mut plain = self.bot.send_message(chat_id, chunk.as_str());
                    if let Some(id) = reply_to {
                        plain = plain.reply_parameters(ReplyParameters::new(id));
                    }
                    plain.await.map_err(|e| Error::Telegram(e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}

/// Decide whether a text message is for the bot and strip a leading mention.
pub(crate) fn select_text(
    text: &str,
    mention_only: bool,
    is_reply_to_bot: bool,
    bot_username: &str,
) -> Option<String> {
    let mention = format!("@{}", bot_username);
    let mentioned = !bot_username.is_empty() && text.contains(&mention);

    if mention_only && !mentioned && !is_reply_to_bot {
        return None;
    }

    // Keep `/cmd@bot` intact; the orchestrator strips that suffix itself.
    let text = if mentioned && !text.trim_start().starts_with('/') {
        text.replace(&mention, " ")
    } else {
        text.to_string()
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
