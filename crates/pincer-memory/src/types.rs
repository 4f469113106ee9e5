//! Records exchanged with the memory stores.

use chrono::{DateTime, Utc};
use pincer_llm::{Message, MessageRole};
use serde::{Deserialize, Serialize};

/// One stored conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the text
    pub role: MessageRole,
    /// The text
    pub content: String,
    /// When the turn was stored
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// A turn stamped with the current time.
    #[must_use]
    pub fn now(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Convert into an inference message.
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

/// A ranked semantic-search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticHit {
    /// Document id
    pub id: String,
    /// Stored text
    pub text: String,
    /// Stored metadata
    pub metadata: serde_json::Value,
    /// Cosine similarity in `0.0..=1.0`
    pub score: f32,
}
