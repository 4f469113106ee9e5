//! Pincer Core - Message routing and dispatch
//!
//! This crate provides the pipeline every inbound message goes through:
//! - Security: allowlist and per-user sliding-window rate limiting
//! - Planner: ordered trigger matching from text to a tool intent
//! - Dispatcher: tool invocation under a time budget with fault isolation
//! - Orchestrator: commands, tool replies and conversation with memory
//! - Scheduler: interval jobs sent through the orchestrator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod planner;
pub mod scheduler;
pub mod security;

pub use dispatcher::{Dispatcher, DispatcherConfig, FaultKind, ToolResult, ToolStatus};
pub use error::{format_error_for_cli, DenialReason, Error, Result, UserFriendlyError};
pub use identity::UserId;
pub use orchestrator::{BotCommand, Orchestrator, OrchestratorConfig};
pub use planner::{plan, Intent, MatchBasis, PlanOutcome, Planner};
pub use scheduler::{
    JobSink, JobTrigger, LogSink, ScheduledJob, SchedulerConfig, SchedulerEngine,
};
pub use security::{AllowList, Decision, RateLimitConfig, SecurityGate};
