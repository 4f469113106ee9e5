//! Ollama HTTP backend
//!
//! Talks to a local Ollama daemon over `/api/chat` with streaming disabled.

mod provider;
mod types;


pub use provider::OllamaProvider;
pub use types::{OllamaConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
