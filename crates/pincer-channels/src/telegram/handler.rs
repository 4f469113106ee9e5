//! Telegram message handler and bot runner

use super::adapter::TelegramAdapter;
use crate::error::Result;
use crate::util::mask_for_logging;
use pincer_core::{Orchestrator, UserId};
use std::sync::Arc;
use std::time::Duration;
use teloxide::{
    prelude::*,
    types::{ChatAction, Message as TelegramMessage},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Telegram drops the typing indicator after about five seconds.
const TYPING_REFRESH: Duration = Duration::from_secs(4);

impl TelegramAdapter {
    /// Poll for updates and answer them until `shutdown` is cancelled.
    #[instrument(skip(self, orchestrator, shutdown))]
    pub async fn run(
        self: Arc<Self>,
        orchestrator: Arc<Orchestrator>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let bot_username: Arc<str> = match self.bot.get_me().await {
            Ok(me) => me.username.clone().unwrap_or_default().into(),
            Err(e) => {
                warn!(error = %e, "Could not fetch bot identity; group mentions disabled");
                "".into()
            }
        };
        info!(username = %bot_username, "Starting Telegram bot");

        let adapter = Arc::clone(&self);
        let handler = Update::filter_message().endpoint(move |bot: Bot, msg: TelegramMessage| {
            let adapter = Arc::clone(&adapter);
            let orchestrator = Arc::clone(&orchestrator);
            let bot_username = Arc::clone(&bot_username);
            async move { Self::handle_update(adapter, orchestrator, bot, msg, &bot_username).await }
        });

        // No distribution key: every update gets its own task, so a slow
        // inference never blocks other chats.
        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .distribution_function(|_| None::<std::convert::Infallible>)
            .build();

        let token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            match token.shutdown() {
                Ok(done) => done.await,
                Err(e) => warn!(error = %e, "Telegram dispatcher was not running"),
            }
        });

        dispatcher.dispatch().await;
        info!("Telegram bot stopped");
        Ok(())
    }

    async fn handle_update(
        adapter: Arc<Self>,
        orchestrator: Arc<Orchestrator>,
        bot: Bot,
        msg: TelegramMessage,
        bot_username: &str,
    ) -> ResponseResult<()> {
        let Some(from) = msg.from.as_ref() else {
            return Ok(());
        };
        let Some(text) = adapter.inbound_text(&msg, bot_username) else {
            return Ok(());
        };
        let user = UserId::from(from.id.0);

        info!(
            chat_id = %msg.chat.id,
            user = %user,
            text = %mask_for_logging(&text),
            "Received message"
        );

        let typing = tokio::spawn({
            let bot = bot.clone();
            let chat_id = msg.chat.id;
            async move {
                loop {
                    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
                    tokio::time::sleep(TYPING_REFRESH).await;
                }
            }
        });

        let reply = orchestrator.handle_message(&user, &text).await;
        typing.abort();

        if let Err(e) = adapter.send_reply(msg.chat.id, Some(msg.id), &reply).await {
            error!(chat_id = %msg.chat.id, error = %e, "Failed to send reply");
        }
        Ok(())
    }
}
