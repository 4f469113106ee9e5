//! Scheduled job replies delivered to Telegram

use super::adapter::TelegramAdapter;
use pincer_core::scheduler::{JobSink, SchedulerError, SchedulerResult};
use pincer_core::ScheduledJob;
use std::sync::Arc;
use teloxide::types::ChatId;

/// Sends each job reply to the private chat of the job's user
pub struct TelegramSink {
    adapter: Arc<TelegramAdapter>,
}

impl TelegramSink {
    /// Create a sink over an adapter
    #[must_use]
    pub fn new(adapter: Arc<TelegramAdapter>) -> Self {
        Self { adapter }
    }
}

/// Private chats share the user's numeric id.
pub(crate) fn chat_for(job: &ScheduledJob) -> SchedulerResult<ChatId> {
    job.user_id
        .as_str()
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| {
            SchedulerError::Delivery(format!(
                "job '{}': user id is not a Telegram chat id",
                job.name
            ))
        })
}

#[async_trait::async_trait]
impl JobSink for TelegramSink {
    async fn deliver(&self, job: &ScheduledJob, reply: &str) -> SchedulerResult<()> {
        let chat_id = chat_for(job)?;
        self.adapter
            .send_reply(chat_id, None, reply)
            .await
            .map_err(|e| SchedulerError::Delivery(e.to_string()))
    }
}
