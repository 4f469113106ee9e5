use super::SqliteStore;
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::kv::KvStore;
use crate::types::Turn;
use chrono::{DateTime, Utc};
use pincer_llm::MessageRole;
use sqlx::Row;

impl SqliteStore {
    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<Turn> {
        let role_str: String = row.try_get("role")?;
        let created_str: String = row.try_get("created_at")?;
        Ok(Turn {
            role: role_str
                .parse::<MessageRole>()
                .map_err(Error::Corrupt)?,
            content: row.try_get("content")?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Total stored turns across all users.
    pub async fn turn_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chat_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }
}

#[async_trait::async_trait]
impl HistoryStore for SqliteStore {
    async fn append_turn(&self, user_id: &str, role: MessageRole, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_history (user_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM chat_history
             WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut turns = rows
            .iter()
            .map(Self::row_to_turn)
            .collect::<Result<Vec<_>>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn clear_history(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_history WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl KvStore for SqliteStore {
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<serde_json::Value> {
            let raw: String = r.try_get("value")?;
            Ok(serde_json::from_str(&raw)?)
        })
        .transpose()
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
