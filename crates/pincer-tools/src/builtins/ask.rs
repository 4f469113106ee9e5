//! Ask tool - a direct question to the local model
//!
//! Unlike the conversational fallback this carries no history; it runs under
//! the dispatcher like any other tool, with a longer budget.

use crate::error::{Error, Result};
use crate::registry::{
    str_arg, ParamKind, ParamSpec, RiskLevel, Tool, ToolCategory, ToolOutput, ToolSpec, Trigger,
};
use pincer_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use std::time::Duration;

/// Budget for inference-backed tools
pub const INFERENCE_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

const ASK_SYSTEM_PROMPT: &str =
    "Answer the question directly and briefly. If you do not know, say so.";

/// Ask tool
pub struct AskTool {
    spec: ToolSpec,
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl AskTool {
    /// Create a new ask tool over an inference provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, max_tokens: u32) -> Self {
        let spec = ToolSpec::new("ask", "Ask the local model a one-off question")
            .with_usage("ask <question>")
            .with_category(ToolCategory::Inference)
            .with_risk_level(RiskLevel::Low)
            .with_timeout(INFERENCE_TOOL_TIMEOUT)
            .with_param(ParamSpec::required("question", ParamKind::String))
            .with_trigger(Trigger::prefix("ask"));

        Self {
            spec,
            provider,
            max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl Tool for AskTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let question = str_arg(&input, "question")?;

        let request = CompletionRequest::new(self.provider.default_model())
            .with_message(Message::system(ASK_SYSTEM_PROMPT))
            .with_message(Message::user(question))
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(Error::Execution("model returned an empty answer".to_string()));
        }
        Ok(ToolOutput::text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincer_llm::MockProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_ask_returns_model_answer() {
        let provider = Arc::new(MockProvider::new());
        provider.push_response("  Paris.  ");
        let tool = AskTool::new(provider.clone(), 64);

        let out = tool
            .execute(json!({"question": "capital of France?"}))
            .await
            .unwrap();
        assert_eq!(out.text, "Paris.");

        let request = provider.last_request().unwrap();
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.messages.last().unwrap().content, "capital of France?");
    }

    #[tokio::test]
    async fn test_ask_maps_backend_failure() {
        let provider = Arc::new(MockProvider::new());
        provider.push_failure("backend down");
        let tool = AskTool::new(provider, 64);

        let err = tool.execute(json!({"question": "hi"})).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_spec_has_long_budget() {
        let tool = AskTool::new(Arc::new(MockProvider::new()), 64);
        assert_eq!(tool.spec().timeout, Some(INFERENCE_TOOL_TIMEOUT));
    }
}
