//! Memory store initialization

use super::config::MemoryConfig;
use anyhow::{Context, Result};
use pincer_memory::{Memory, TermIndex};
use std::sync::Arc;
use tracing::info;

/// Open the configured memory, or `None` when it is disabled
pub async fn open_memory(config: &MemoryConfig) -> Result<Option<Memory>> {
    if !config.enabled {
        info!("Conversation memory disabled by configuration");
        return Ok(None);
    }

    let path = config.database_path();
    let mut memory = Memory::from_path(&path)
        .await
        .with_context(|| format!("Failed to open memory database at {}", path.display()))?;

    if config.semantic_enabled {
        memory = memory.with_semantic(Arc::new(TermIndex::new()));
        info!(top_k = config.semantic_top_k, "Semantic recall enabled");
    }

    Ok(Some(memory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_memory() {
        let config = MemoryConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(open_memory(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_memory_with_semantic() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig {
            sqlite_path: dir
                .path()
                .join("nested")
                .join("pincer.db")
                .to_string_lossy()
                .to_string(),
            semantic_enabled: true,
            ..Default::default()
        };

        let memory = open_memory(&config).await.unwrap().unwrap();
        assert!(memory.has_semantic());
        assert!(dir.path().join("nested").join("pincer.db").exists());
    }
}
