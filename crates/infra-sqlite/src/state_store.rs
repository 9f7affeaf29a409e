// SQLite StateStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sendq_core::error::Result;
use sendq_core::port::{StateStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Record key used when none is configured
pub const DEFAULT_RECORD_KEY: &str = "queue";

/// Keeps the serialized queue record in the `state_records` table
pub struct SqliteStateStore {
    pool: SqlitePool,
    key: String,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteStateStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            key: DEFAULT_RECORD_KEY.to_string(),
            time_provider,
        }
    }

    /// Use a different record key (one queue instance per key)
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Last write time in epoch ms, if a record exists
    pub async fn updated_at(&self) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT updated_at FROM state_records WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM state_records WHERE key = ?")
                .bind(&self.key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        debug!(key = %self.key, found = value.is_some(), "Loaded state record");
        Ok(value)
    }

    async fn save(&self, record: &str) -> Result<()> {
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO state_records (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(record)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(key = %self.key, bytes = record.len(), "Saved state record");
        Ok(())
    }
}
