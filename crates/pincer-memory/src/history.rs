//! Per-user conversation history.

use crate::error::Result;
use crate::types::Turn;
use pincer_llm::MessageRole;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Append-only conversation log keyed by user.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record one turn at the end of the user's history.
    async fn append_turn(&self, user_id: &str, role: MessageRole, content: &str) -> Result<()>;

    /// The last `limit` turns, oldest first.
    async fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>>;

    /// Drop the user's history, returning how many turns were removed.
    async fn clear_history(&self, user_id: &str) -> Result<u64>;
}

/// Process-lifetime history, mostly for tests and the terminal REPL.
#[derive(Default)]
pub struct InMemoryHistory {
    turns: RwLock<HashMap<String, Vec<Turn>>>,
}

impl InMemoryHistory {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append_turn(&self, user_id: &str, role: MessageRole, content: &str) -> Result<()> {
        self.turns
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(Turn::now(role, content));
        Ok(())
    }

    async fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>> {
        let turns = self.turns.read().await;
        Ok(turns
            .get(user_id)
            .map(|all| all[all.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default())
    }

    async fn clear_history(&self, user_id: &str) -> Result<u64> {
        Ok(self
            .turns
            .write()
            .await
            .remove(user_id)
            .map_or(0, |t| t.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_history_is_oldest_first_and_bounded() {
        let store = InMemoryHistory::new();
        for i in 0..5 {
            store
                .append_turn("alice", MessageRole::User, &format!("m{i}"))
                .await
                .unwrap();
        }

        let recent = store.recent_history("alice", 3).await.unwrap();
        let texts: Vec<_> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = InMemoryHistory::new();
        store
            .append_turn("alice", MessageRole::User, "hi")
            .await
            .unwrap();
        assert!(store.recent_history("bob", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_history() {
        let store = InMemoryHistory::new();
        store
            .append_turn("alice", MessageRole::User, "hi")
            .await
            .unwrap();
        store
            .append_turn("alice", MessageRole::Assistant, "hello")
            .await
            .unwrap();

        assert_eq!(store.clear_history("alice").await.unwrap(), 2);
        assert_eq!(store.clear_history("alice").await.unwrap(), 0);
        assert!(store.recent_history("alice", 10).await.unwrap().is_empty());
    }
}
