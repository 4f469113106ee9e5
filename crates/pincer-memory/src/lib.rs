//! Pincer Memory - conversation history and recall
//!
//! Three independent stores sit behind the [`Memory`] facade:
//!
//! ```text
//! save_turn ──► HistoryStore (SQLite / in-memory)
//!          └──► SemanticStore (TermIndex)     ◄── search
//! KvStore (SQLite) for small JSON records
//! ```
//!
//! The orchestrator treats all of them as best-effort.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod history;
pub mod kv;
pub mod semantic;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use history::{HistoryStore, InMemoryHistory};
pub use kv::KvStore;
pub use semantic::{MetadataFilter, SemanticStore, TermIndex};
pub use store::SqliteStore;
pub use types::{SemanticHit, Turn};

use pincer_llm::MessageRole;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// High-level facade over history, semantic and key-value stores.
#[derive(Clone)]
pub struct Memory {
    history: Arc<dyn HistoryStore>,
    semantic: Option<Arc<dyn SemanticStore>>,
    kv: Option<Arc<dyn KvStore>>,
}

impl Memory {
    /// Facade over a single history store.
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self {
            history,
            semantic: None,
            kv: None,
        }
    }

    /// SQLite file for history and key-value data.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let store = Arc::new(SqliteStore::from_path(path).await?);
        Ok(Self::new(store.clone()).with_kv(store))
    }

    /// Everything in memory (tests, REPL).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryHistory::new()))
    }

    /// Attach a semantic store; saved turns are indexed into it.
    #[must_use]
    pub fn with_semantic(mut self, semantic: Arc<dyn SemanticStore>) -> Self {
        self.semantic = Some(semantic);
        self
    }

    /// Attach a key-value store.
    #[must_use]
    pub fn with_kv(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Whether semantic recall is available.
    #[must_use]
    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    /// The key-value store, if attached.
    #[must_use]
    pub fn kv(&self) -> Option<&Arc<dyn KvStore>> {
        self.kv.as_ref()
    }

    /// Append a turn to history and index it for recall.
    ///
    /// Only the history write can fail; indexing errors are logged.
    pub async fn save_turn(&self, user_id: &str, role: MessageRole, content: &str) -> Result<()> {
        self.history.append_turn(user_id, role, content).await?;

        if let Some(semantic) = &self.semantic {
            let id = uuid::Uuid::new_v4().to_string();
            let metadata = json!({ "user": user_id, "role": role.as_str() });
            if let Err(e) = semantic.upsert(&id, content, metadata).await {
                warn!(user_id, error = %e, "Failed to index turn");
            }
        }
        Ok(())
    }

    /// The last `limit` turns, oldest first.
    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>> {
        self.history.recent_history(user_id, limit).await
    }

    /// The user's own past turns most similar to `query`.
    pub async fn search(&self, user_id: &str, query: &str, k: usize) -> Result<Vec<SemanticHit>> {
        let Some(semantic) = &self.semantic else {
            return Ok(Vec::new());
        };
        let filter = user_filter(user_id);
        semantic.query(query, k, Some(&filter)).await
    }

    /// Forget everything stored for the user.
    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        let removed = self.history.clear_history(user_id).await?;
        if let Some(semantic) = &self.semantic {
            let dropped = semantic.delete_matching(&user_filter(user_id)).await?;
            debug!(user_id, dropped, "Cleared semantic entries");
        }
        Ok(removed)
    }
}

fn user_filter(user_id: &str) -> MetadataFilter {
    let mut filter = MetadataFilter::new();
    filter.insert("user".to_string(), json!(user_id));
    filter
}
