//! Server module for Pincer
//!
//! Loads configuration, wires the components and runs the long-lived tasks.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Startup configuration checks
//! - `providers`: Inference backend resolution
//! - `init_stores`: Memory store initialization
//! - `background_tasks`: Scheduler and cleanup tasks
//! - `logging`: Tracing subscriber setup
//! - `init`: Component wiring and the run loop

mod background_tasks;
pub mod config;
mod init;
mod init_stores;
mod loader;
mod logging;
mod providers;
mod validation;

// Re-export public API
pub use init::{build_orchestrator, build_registry, run};
pub use loader::load_config;
pub use logging::init_tracing;
pub use providers::resolve_llm_provider;
pub use validation::validate_config;
