use super::*;
use async_trait::async_trait;
use mockall::mock;
use crate::identity::UserId;
use crate::security::{AllowList, RateLimitConfig, SecurityGate};
use pincer_llm::{
    CompletionRequest, CompletionResponse, LlmProvider, MessageRole, MockProvider,
};
use pincer_memory::{HistoryStore, Memory, TermIndex, Turn};
use pincer_tools::{register_builtins, Tool, ToolOutput, ToolRegistry, ToolSpec, Trigger};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const APOLOGY: &str = "Sorry, I can't reach my language model right now. Please try again later.";

struct SpyTool {
    spec: ToolSpec,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl Tool for SpyTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, _input: Value) -> pincer_tools::Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(pincer_tools::Error::Execution(
                "sqlite at /srv/pincer/secret.db is locked".into(),
            ))
        } else {
            Ok(ToolOutput::text("spy ran"))
        }
    }
}

/// Replies with the last user message, so pairing can be checked.
struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn default_model(&self) -> &str {
        "echo-model"
    }

    async fn complete(&self, request: CompletionRequest) -> pincer_llm::Result<CompletionResponse> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        tokio::task::yield_now().await;
        Ok(CompletionResponse {
            content: format!("echo: {}", last),
            usage: None,
            finish_reason: None,
            model: "echo-model".into(),
        })
    }
}

mock! {
    History {}

    #[async_trait]
    impl HistoryStore for History {
        async fn append_turn(&self, user_id: &str, role: MessageRole, content: &str) -> pincer_memory::Result<()>;
        async fn recent_history(&self, user_id: &str, limit: usize) -> pincer_memory::Result<Vec<Turn>>;
        async fn clear_history(&self, user_id: &str) -> pincer_memory::Result<u64>;
    }
}

fn gate(max_requests: u32) -> Arc<SecurityGate> {
    Arc::new(SecurityGate::new(
        AllowList::Unrestricted,
        RateLimitConfig::per_minute(max_requests),
    ))
}

fn builtin_orchestrator(max_requests: u32) -> Orchestrator {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, None).unwrap();
    Orchestrator::new(gate(max_requests), Arc::new(registry), OrchestratorConfig::default()).unwrap()
}

fn user() -> UserId {
    UserId::from(42_i64)
}

#[tokio::test]
async fn test_calc_replies_with_result() {
    let orchestrator = builtin_orchestrator(10);
    assert_eq!(orchestrator.handle_message(&user(), "calc 2+2").await, "4");
}

#[tokio::test]
async fn test_calc_bad_input_shows_usage() {
    let orchestrator = builtin_orchestrator(10);
    let reply = orchestrator.handle_message(&user(), "calc 1/0").await;
    assert!(reply.starts_with("I couldn't use that input."));
    assert!(reply.contains("Usage:"));
}

#[tokio::test]
async fn test_disabled_shell_never_executes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(SpyTool {
            spec: ToolSpec::new("shell", "Run commands")
                .with_trigger(Trigger::prefix("run:"))
                .with_enabled(false),
            calls: Arc::clone(&calls),
            fail: false,
        }))
        .unwrap();

    let orchestrator = Orchestrator::new(gate(10), Arc::new(registry), OrchestratorConfig::default())
        .unwrap()
        .with_llm(Arc::new(MockProvider::new()));

    let reply = orchestrator.handle_message(&user(), "run: rm -rf /").await;
    assert_eq!(reply, "mock response");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_eleventh_message_is_rate_limited() {
    let orchestrator = builtin_orchestrator(10);
    for _ in 0..10 {
        assert_eq!(orchestrator.handle_message(&user(), "calc 1+1").await, "2");
    }

    let reply = orchestrator.handle_message(&user(), "calc 1+1").await;
    assert!(reply.contains("Too many requests"));

    // Another user still has a full budget.
    assert_eq!(
        orchestrator.handle_message(&UserId::from("7"), "calc 1+1").await,
        "2"
    );

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(orchestrator.handle_message(&user(), "calc 1+1").await, "2");
}

#[tokio::test]
async fn test_commands_consume_budget() {
    let orchestrator = builtin_orchestrator(1);
    assert!(orchestrator.handle_message(&user(), "/help").await.contains("/reset"));
    assert!(orchestrator
        .handle_message(&user(), "/help")
        .await
        .contains("Too many requests"));
}

#[tokio::test]
async fn test_not_allowlisted_caller_is_refused() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(SpyTool {
            spec: ToolSpec::new("spy", "Spy").with_trigger(Trigger::prefix("spy")),
            calls: Arc::clone(&calls),
            fail: false,
        }))
        .unwrap();
    let gate = Arc::new(SecurityGate::new(
        AllowList::only(["1001"]),
        RateLimitConfig::default(),
    ));
    let orchestrator =
        Orchestrator::new(gate, Arc::new(registry), OrchestratorConfig::default()).unwrap();

    let reply = orchestrator.handle_message(&UserId::from("666"), "spy now").await;
    assert_eq!(reply, "You are not authorised to use this bot.");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(
        orchestrator.handle_message(&UserId::from("1001"), "spy now").await,
        "spy ran"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_faulty_tool_gives_generic_failure() {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(SpyTool {
            spec: ToolSpec::new("broken", "Always fails").with_trigger(Trigger::prefix("broken")),
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }))
        .unwrap();
    let orchestrator =
        Orchestrator::new(gate(10), Arc::new(registry), OrchestratorConfig::default()).unwrap();

    let reply = orchestrator.handle_message(&user(), "broken please").await;
    assert_eq!(
        reply,
        "Sorry, something went wrong while handling that. Please try again."
    );
    assert!(!reply.contains("/srv"));

    // The fault stays with that call.
    assert!(orchestrator.handle_message(&user(), "/help").await.contains("/status"));
}

#[tokio::test]
async fn test_no_trigger_and_inference_down_apologizes() {
    let orchestrator = builtin_orchestrator(10).with_llm(Arc::new(MockProvider::unavailable()));
    assert_eq!(
        orchestrator.handle_message(&user(), "tell me a story").await,
        APOLOGY
    );
}

#[tokio::test]
async fn test_no_backend_apologizes() {
    let orchestrator = builtin_orchestrator(10);
    assert_eq!(orchestrator.handle_message(&user(), "hello there").await, APOLOGY);
}

#[tokio::test(start_paused = true)]
async fn test_inference_timeout_apologizes() {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, None).unwrap();
    let orchestrator = Orchestrator::new(
        gate(10),
        Arc::new(registry),
        OrchestratorConfig::new().with_inference_timeout(Duration::from_secs(5)),
    )
    .unwrap()
    .with_llm(Arc::new(
        MockProvider::new().with_delay(Duration::from_secs(300)),
    ));

    assert_eq!(orchestrator.handle_message(&user(), "hello there").await, APOLOGY);
}

#[tokio::test]
async fn test_conversation_uses_and_records_history() {
    let llm = Arc::new(MockProvider::new());
    llm.push_response("Hi, I'm Pincer.");
    llm.push_response("You said hello.");
    let memory = Memory::in_memory();
    let orchestrator = builtin_orchestrator(10)
        .with_llm(llm.clone())
        .with_memory(memory.clone());

    assert_eq!(
        orchestrator.handle_message(&user(), "hello").await,
        "Hi, I'm Pincer."
    );
    assert_eq!(
        orchestrator.handle_message(&user(), "what did I say?").await,
        "You said hello."
    );

    let request = llm.last_request().unwrap();
    let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User
        ]
    );
    assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(request.messages[3].content, "what did I say?");
    assert_eq!(request.max_tokens, Some(512));

    assert_eq!(memory.history("42", 10).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_failed_inference_is_not_recorded() {
    let memory = Memory::in_memory();
    let orchestrator = builtin_orchestrator(10)
        .with_llm(Arc::new(MockProvider::unavailable()))
        .with_memory(memory.clone());

    orchestrator.handle_message(&user(), "hello").await;
    assert!(memory.history("42", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tool_exchanges_are_recorded() {
    let memory = Memory::in_memory();
    let orchestrator = builtin_orchestrator(10).with_memory(memory.clone());

    orchestrator.handle_message(&user(), "calc 6*7").await;
    let turns = memory.history("42", 10).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "calc 6*7");
    assert_eq!(turns[1].content, "42");
}

#[tokio::test]
async fn test_semantic_recall_is_added_as_context() {
    let llm = Arc::new(MockProvider::new());
    let memory = Memory::in_memory().with_semantic(Arc::new(TermIndex::new()));
    let orchestrator = Orchestrator::new(
        gate(10),
        Arc::new(ToolRegistry::new()),
        OrchestratorConfig::new().with_history_limit(0),
    )
    .unwrap()
    .with_llm(llm.clone())
    .with_memory(memory);

    orchestrator
        .handle_message(&user(), "my cat is called Miso")
        .await;
    orchestrator
        .handle_message(&user(), "what is my cat called?")
        .await;

    let request = llm.last_request().unwrap();
    assert_eq!(request.messages.len(), 3);
    assert_eq!(request.messages[1].role, MessageRole::System);
    assert!(request.messages[1].content.contains("Miso"));
}

#[tokio::test]
async fn test_memory_failure_still_replies() {
    let mut history = MockHistory::new();
    history
        .expect_recent_history()
        .returning(|_, _| Err(pincer_memory::Error::Internal("disk full".into())));
    history
        .expect_append_turn()
        .times(1)
        .returning(|_, _, _| Err(pincer_memory::Error::Internal("disk full".into())));

    let llm = Arc::new(MockProvider::new());
    llm.push_response("Still here.");
    let orchestrator = builtin_orchestrator(10)
        .with_llm(llm)
        .with_memory(Memory::new(Arc::new(history)));

    assert_eq!(
        orchestrator.handle_message(&user(), "are you there?").await,
        "Still here."
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_history_writes_do_not_interleave() {
    let memory = Memory::in_memory();
    let orchestrator = Arc::new(
        Orchestrator::new(
            gate(100),
            Arc::new(ToolRegistry::new()),
            OrchestratorConfig::default(),
        )
        .unwrap()
        .with_llm(Arc::new(EchoProvider))
        .with_memory(memory.clone()),
    );

    let words = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel"];
    let handles: Vec<_> = words
        .iter()
        .map(|word| {
            let orchestrator = Arc::clone(&orchestrator);
            let text = format!("say {}", word);
            tokio::spawn(async move { orchestrator.handle_message(&user(), &text).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let turns = memory.history("42", 100).await.unwrap();
    assert_eq!(turns.len(), words.len() * 2);
    for pair in turns.chunks(2) {
        assert_eq!(pair[0].role, MessageRole::User);
        assert_eq!(pair[1].role, MessageRole::Assistant);
        assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
    }
}

#[test]
fn test_help_outside_async_context() {
    let orchestrator = builtin_orchestrator(10);
    let help = tokio_test::block_on(orchestrator.handle_message(&user(), "/help"));
    assert!(help.starts_with("Pincer - local assistant"));
}

#[tokio::test]
async fn test_start_and_help() {
    let orchestrator = builtin_orchestrator(10);
    let welcome = orchestrator.handle_message(&user(), "/start").await;
    assert!(welcome.starts_with("Hello! I'm Pincer"));
    assert!(welcome.contains("calc"));

    let help = orchestrator.handle_message(&user(), "/help@pincer_bot").await;
    assert!(help.contains("/status"));
}

#[tokio::test]
async fn test_status_reports_tools_and_backend() {
    let orchestrator = builtin_orchestrator(10).with_llm(Arc::new(MockProvider::new()));
    let status = orchestrator.handle_message(&user(), "/status").await;
    assert!(status.contains("calculator"));
    assert!(!status.contains("shell:"));
    assert!(status.contains("mock (mock-model)"));
    assert!(status.contains("Memory: disabled"));
    assert!(status.contains("1/10"));
}

#[tokio::test]
async fn test_reset_clears_history() {
    let memory = Memory::in_memory();
    let orchestrator = builtin_orchestrator(10).with_memory(memory.clone());

    orchestrator.handle_message(&user(), "calc 1+2").await;
    assert_eq!(memory.history("42", 10).await.unwrap().len(), 2);

    let reply = orchestrator.handle_message(&user(), "/reset").await;
    assert_eq!(reply, "Conversation history cleared.");
    assert!(memory.history("42", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_command_and_empty_message() {
    let orchestrator = builtin_orchestrator(10);
    assert_eq!(
        orchestrator.handle_message(&user(), "/frobnicate").await,
        "Unknown command. Try /help."
    );
    assert!(orchestrator.handle_message(&user(), "   ").await.contains("/help"));
}

#[tokio::test]
async fn test_blank_messages_cost_no_budget() {
    let orchestrator = builtin_orchestrator(1);
    for blank in ["", "   ", "\n\t"] {
        assert!(orchestrator.handle_message(&user(), blank).await.contains("/help"));
    }
    assert_eq!(orchestrator.gate().usage(&user()).0, 0);
    assert_eq!(orchestrator.handle_message(&user(), "calc 1+1").await, "2");
}

#[tokio::test]
async fn test_cleanup_drops_idle_state() {
    let memory = Memory::in_memory();
    let orchestrator = builtin_orchestrator(10).with_memory(memory);
    orchestrator.handle_message(&user(), "calc 1+1").await;
    assert_eq!(orchestrator.write_locks.len(), 1);
    orchestrator.cleanup();
    assert!(orchestrator.write_locks.is_empty());
}
