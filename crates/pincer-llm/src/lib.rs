//! Pincer LLM - local inference backends
//!
//! This crate provides the inference seam used by the assistant:
//! - llama.cpp CLI subprocess backend
//! - Ollama HTTP backend
//! - Mock provider for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod llama;
pub mod message;
pub mod mock;
pub mod ollama;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use llama::{LlamaCliProvider, LlamaConfig};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::LlmProvider;
