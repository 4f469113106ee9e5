//! Pincer Tools - Tool Registry and Built-in Tools
//!
//! This crate provides the tool system for Pincer:
//! - Registry: tool specs, triggers and case-insensitive lookup
//! - Builtins: calculator, file manager, shell, web search, ask

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod registry;

pub use builtins::{register_builtins, register_builtins_with_config, BuiltinsConfig};
pub use error::{Error, Result};
pub use registry::{
    str_arg, ArgStyle, Matcher, ParamKind, ParamSpec, RegisteredTool, RiskLevel, Tool,
    ToolCategory, ToolOutput, ToolRegistry, ToolSettings, ToolSpec, Trigger,
};
