//! Session orchestrator - one entry point per inbound message
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `core`: `Orchestrator` struct and builder methods
//! - `process`: `handle_message`, conversation and memory writes
//! - `commands`: slash command parsing and replies
//! - `format`: reply text for dispatch results

mod commands;
mod config;
mod core;
mod format;
mod process;

#[cfg(test)]
mod tests;

pub use commands::BotCommand;
pub use config::{OrchestratorConfig, DEFAULT_BOT_NAME, DEFAULT_SYSTEM_PROMPT};
pub use core::Orchestrator;
