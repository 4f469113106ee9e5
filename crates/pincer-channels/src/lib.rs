//! Pincer Channels - Chat transports
//!
//! This crate connects chat platforms to the orchestrator:
//! - Telegram (via teloxide long polling)
//! - Shared text helpers for logging and formatting replies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod telegram;
pub mod util;

pub use error::{Error, Result};
pub use telegram::{TelegramAdapter, TelegramConfig, TelegramSink};
