//! Small JSON key-value store.

use crate::error::Result;

/// Key-value persistence for JSON values.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Insert or replace a value.
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Fetch a value.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Remove a value, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}
