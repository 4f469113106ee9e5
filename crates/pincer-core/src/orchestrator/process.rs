//! Message handling: commands, tool intents and conversation

use crate::error::{Error, UserFriendlyError};
use crate::identity::UserId;
use crate::planner::{Intent, PlanOutcome};
use pincer_llm::{CompletionRequest, Message, MessageRole};
use pincer_memory::Turn;
use tracing::{debug, info, instrument, warn};

use super::commands::{help_text, welcome_text, BotCommand, StatusReport};
use super::core::Orchestrator;
use super::format::format_tool_result;

const EMPTY_MESSAGE: &str = "Send me a message, or /help to see what I can do.";

impl Orchestrator {
    /// Handle one inbound message and produce the reply text.
    ///
    /// Every non-blank message passes the security gate exactly once,
    /// commands included. Blank messages cost nothing. Never fails: tool faults, timeouts and inference outages
    /// all become fixed user-facing text.
    #[instrument(skip(self, text), fields(user = %user, chars = text.chars().count()))]
    pub async fn handle_message(&self, user: &UserId, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }

        if let Some(reason) = self.gate.authorize(user).denial() {
            return Error::AuthDenied(reason).user_message();
        }

        if let Some(command) = BotCommand::parse(text) {
            debug!(?command, "Bot command");
            return self.run_command(user, command).await;
        }

        match self.planner.plan(text) {
            PlanOutcome::Intent(intent) => self.run_intent(user, text, intent).await,
            PlanOutcome::NoMatch => self.converse(user, text).await,
        }
    }

    async fn run_intent(&self, user: &UserId, text: &str, intent: Intent) -> String {
        debug!(tool = %intent.tool_name, basis = ?intent.basis, "Planned tool call");
        let tool_name = intent.tool_name.clone();
        let result = self.dispatcher.dispatch_authorized(user, intent).await;

        let usage = self
            .registry()
            .get(&tool_name)
            .map(|t| t.spec.usage.as_str());
        let reply = format_tool_result(&result, usage);

        if result.is_success() {
            self.remember(user, text, &reply).await;
        }
        reply
    }

    async fn converse(&self, user: &UserId, text: &str) -> String {
        let Some(llm) = self.llm.clone() else {
            warn!(user = %user, "No inference backend configured");
            return Error::InferenceUnavailable("no backend configured".to_string()).user_message();
        };

        let mut request = CompletionRequest::new("")
            .with_messages(self.build_messages(user, text).await)
            .with_max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        let budget = self.config.inference_timeout;
        let mut handle = tokio::spawn(async move { llm.complete(request).await });
        let outcome = match tokio::time::timeout(budget, &mut handle).await {
            Err(_) => {
                handle.abort();
                Err(Error::InferenceUnavailable(format!(
                    "no reply within {}ms",
                    budget.as_millis()
                )))
            }
            Ok(Err(join_err)) => Err(Error::InferenceUnavailable(join_err.to_string())),
            Ok(Ok(response)) => response.map_err(Error::from),
        };

        match outcome {
            Ok(response) if !response.content.trim().is_empty() => {
                let reply = response.content.trim().to_string();
                info!(user = %user, model = %response.model, "Inference reply");
                self.remember(user, text, &reply).await;
                reply
            }
            Ok(_) => {
                warn!(user = %user, "Inference returned an empty reply");
                Error::InferenceUnavailable("empty reply".to_string()).user_message()
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Inference failed");
                e.user_message()
            }
        }
    }

    /// System prompt, recalled context, recent history, then the new text.
    async fn build_messages(&self, user: &UserId, text: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(self.config.system_prompt.clone())];

        let Some(memory) = &self.memory else {
            messages.push(Message::user(text));
            return messages;
        };

        let history: Vec<Turn> = match memory.history(user.as_str(), self.config.history_limit).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to load history");
                Vec::new()
            }
        };

        if self.config.semantic_top_k > 0 && memory.has_semantic() {
            match memory
                .search(user.as_str(), text, self.config.semantic_top_k)
                .await
            {
                Ok(hits) => {
                    let recalled: Vec<String> = hits
                        .into_iter()
                        .filter(|hit| !history.iter().any(|t| t.content == hit.text))
                        .map(|hit| format!("- {}", hit.text))
                        .collect();
                    if !recalled.is_empty() {
                        debug!(user = %user, recalled = recalled.len(), "Adding recalled context");
                        messages.push(Message::system(format!(
                            "Relevant earlier conversation:\n{}",
                            recalled.join("\n")
                        )));
                    }
                }
                Err(e) => warn!(user = %user, error = %e, "Semantic recall failed"),
            }
        }

        messages.extend(history.iter().map(Turn::to_message));
        messages.push(Message::user(text));
        messages
    }

    /// Store the exchange. Writes for one user never interleave.
    async fn remember(&self, user: &UserId, text: &str, reply: &str) {
        let Some(memory) = &self.memory else {
            return;
        };

        let lock = self.write_lock(user);
        let _guard = lock.lock().await;
        for (role, content) in [(MessageRole::User, text), (MessageRole::Assistant, reply)] {
            if let Err(e) = memory.save_turn(user.as_str(), role, content).await {
                warn!(user = %user, role = role.as_str(), error = %e, "Failed to save turn");
                return;
            }
        }
    }

    async fn run_command(&self, user: &UserId, command: BotCommand) -> String {
        let tools = self.registry().list_enabled();
        match command {
            BotCommand::Start => welcome_text(&self.config.bot_name, &tools),
            BotCommand::Help => help_text(&self.config.bot_name, &tools),
            BotCommand::Status => StatusReport {
                bot_name: &self.config.bot_name,
                tools,
                inference: self
                    .llm
                    .as_deref()
                    .map(|llm| (llm.name(), llm.default_model())),
                memory: match &self.memory {
                    None => "disabled",
                    Some(m) if m.has_semantic() => "enabled (with recall)",
                    Some(_) => "enabled",
                },
                usage: self.gate.usage(user),
            }
            .render(),
            BotCommand::Reset => self.reset_history(user).await,
            BotCommand::Unknown(name) => {
                debug!(command = %name, "Unknown command");
                "Unknown command. Try /help.".to_string()
            }
        }
    }

    async fn reset_history(&self, user: &UserId) -> String {
        let Some(memory) = &self.memory else {
            return "There is no conversation history to clear.".to_string();
        };

        let lock = self.write_lock(user);
        let _guard = lock.lock().await;
        match memory.clear(user.as_str()).await {
            Ok(removed) => {
                info!(user = %user, removed, "History cleared");
                "Conversation history cleared.".to_string()
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Failed to clear history");
                "Sorry, I couldn't clear your history right now.".to_string()
            }
        }
    }
}
