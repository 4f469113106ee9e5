//! Dispatcher - authorize, resolve, run under a budget, normalize
//!
//! `dispatch` never fails and never panics: every outcome, including a
//! panicking tool, becomes a [`ToolResult`].

use crate::error::{DenialReason, Error};
use crate::identity::UserId;
use crate::planner::Intent;
use crate::security::{Decision, SecurityGate};
use pincer_tools::{ToolOutput, ToolRegistry};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};


/// Default budget for tools that do not declare their own
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Budget for tools without their own timeout
    pub default_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Normalized outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Tool returned output
    Success,
    /// Tool failed or panicked
    ToolError,
    /// Caller refused by the security gate
    Denied,
    /// Tool exceeded its budget
    Timeout,
    /// Tool unknown or disabled
    NotFound,
}

impl ToolStatus {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ToolError => "tool_error",
            Self::Denied => "denied",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
        }
    }
}

/// What kind of tool failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The arguments were unusable
    InvalidInput,
    /// The tool refused the operation
    PermissionDenied,
    /// The inference backend behind the tool failed
    Inference,
    /// The tool panicked
    Panic,
    /// Any other failure
    Execution,
}

/// Normalized result of one dispatch
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Outcome status
    pub status: ToolStatus,
    /// Tool that was asked for
    pub tool: String,
    /// Output on success
    pub payload: Option<ToolOutput>,
    /// Operator-facing detail; never shown to users
    pub detail: Option<String>,
    /// Failure kind for `tool_error`
    pub fault: Option<FaultKind>,
    /// Denial reason for `denied`
    pub denial: Option<DenialReason>,
    /// Wall-clock time spent
    pub duration_ms: u64,
}

impl ToolResult {
    fn base(status: ToolStatus, tool: String) -> Self {
        Self {
            status,
            tool,
            payload: None,
            detail: None,
            fault: None,
            denial: None,
            duration_ms: 0,
        }
    }

    /// A successful result
    #[must_use]
    pub fn success(tool: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            payload: Some(output),
            ..Self::base(ToolStatus::Success, tool.into())
        }
    }

    /// A failed result
    #[must_use]
    pub fn tool_error(tool: impl Into<String>, fault: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            fault: Some(fault),
            detail: Some(detail.into()),
            ..Self::base(ToolStatus::ToolError, tool.into())
        }
    }

    /// A refused call
    #[must_use]
    pub fn denied(tool: impl Into<String>, reason: DenialReason) -> Self {
        Self {
            denial: Some(reason),
            detail: Some(reason.to_string()),
            ..Self::base(ToolStatus::Denied, tool.into())
        }
    }

    /// A call that ran out of time
    #[must_use]
    pub fn timeout(tool: impl Into<String>, budget: Duration) -> Self {
        Self {
            detail: Some(format!("exceeded {}ms budget", budget.as_millis())),
            ..Self::base(ToolStatus::Timeout, tool.into())
        }
    }

    /// An unknown or disabled tool
    #[must_use]
    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::base(ToolStatus::NotFound, tool.into())
    }

    fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = elapsed.as_millis() as u64;
        self
    }

    /// Whether the tool produced output
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// The matching error, for anything but success and not_found
    #[must_use]
    pub fn to_error(&self) -> Option<Error> {
        let detail = self.detail.clone().unwrap_or_default();
        match self.status {
            ToolStatus::Success | ToolStatus::NotFound => None,
            ToolStatus::Denied => self.denial.map(Error::AuthDenied),
            ToolStatus::Timeout => Some(Error::ToolTimeout {
                tool: self.tool.clone(),
                timeout_ms: self.duration_ms,
            }),
            ToolStatus::ToolError => Some(Error::ToolFault {
                tool: self.tool.clone(),
                detail,
            }),
        }
    }
}

fn classify(err: &pincer_tools::Error) -> FaultKind {
    match err {
        pincer_tools::Error::InvalidInput(_) => FaultKind::InvalidInput,
        pincer_tools::Error::PermissionDenied(_) => FaultKind::PermissionDenied,
        pincer_tools::Error::Inference(_) => FaultKind::Inference,
        _ => FaultKind::Execution,
    }
}

/// Runs intents against the registry
pub struct Dispatcher {
    gate: Arc<SecurityGate>,
    registry: Arc<ToolRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        gate: Arc<SecurityGate>,
        registry: Arc<ToolRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            gate,
            registry,
            config,
        }
    }

    /// The registry tools are resolved against
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Authorize the caller, then run the intent.
    #[instrument(skip(self, intent), fields(user = %user, tool = %intent.tool_name))]
    pub async fn dispatch(&self, user: &UserId, intent: Intent) -> ToolResult {
        match self.gate.authorize(user) {
            Decision::Allowed => self.dispatch_authorized(user, intent).await,
            decision => {
                let reason = decision.denial().unwrap_or(DenialReason::NotAllowlisted);
                ToolResult::denied(intent.tool_name, reason)
            }
        }
    }

    /// Run an intent for a caller that already passed the gate this turn.
    pub async fn dispatch_authorized(&self, user: &UserId, intent: Intent) -> ToolResult {
        let Some(tool) = self
            .registry
            .get(&intent.tool_name)
            .filter(|t| t.spec.enabled)
        else {
            warn!(user = %user, tool = %intent.tool_name, "Intent names an unknown or disabled tool");
            return ToolResult::not_found(intent.tool_name);
        };

        let name = tool.spec.name.clone();
        let budget = tool.spec.timeout.unwrap_or(self.config.default_timeout);
        let handler = Arc::clone(&tool.handler);
        let input = Value::Object(intent.arguments);
        let started = Instant::now();

        let mut handle = tokio::spawn(async move { handler.execute(input).await });
        let result = match tokio::time::timeout(budget, &mut handle).await {
            Err(_) => {
                handle.abort();
                ToolResult::timeout(&name, budget)
            }
            Ok(Err(join_err)) if join_err.is_panic() => {
                error!(user = %user, tool = %name, "Tool panicked");
                ToolResult::tool_error(&name, FaultKind::Panic, "tool panicked")
            }
            Ok(Err(join_err)) => ToolResult::tool_error(&name, FaultKind::Execution, join_err.to_string()),
            Ok(Ok(Err(pincer_tools::Error::Timeout(ms)))) => {
                ToolResult::timeout(&name, Duration::from_millis(ms))
            }
            Ok(Ok(Err(e))) => ToolResult::tool_error(&name, classify(&e), e.to_string()),
            Ok(Ok(Ok(output))) => ToolResult::success(&name, output),
        };
        let result = result.with_duration(started.elapsed());

        match result.status {
            ToolStatus::Success => {
                info!(user = %user, tool = %name, duration_ms = result.duration_ms, "Tool succeeded");
            }
            status => {
                warn!(
                    user = %user,
                    tool = %name,
                    status = status.as_str(),
                    detail = result.detail.as_deref().unwrap_or(""),
                    duration_ms = result.duration_ms,
                    "Tool did not succeed"
                );
            }
        }
        result
    }
}
