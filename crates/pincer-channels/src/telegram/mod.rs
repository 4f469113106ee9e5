//! Telegram - teloxide adapter
//!
//! Long polling, one task per update, replies in HTML with a plain-text
//! fallback. Authorization is left to the orchestrator's security gate.

mod adapter;
mod config;
mod handler;
mod sink;


pub use adapter::TelegramAdapter;
pub use config::TelegramConfig;
pub use sink::TelegramSink;
