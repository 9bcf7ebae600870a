use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use tracing::{debug, instrument};

use crate::source::PriceSource;
use crate::store::SnapshotStore;
use crate::time::{Clock, to_ms};

/// SQLx-backed options table.
///
/// Serves both as the raw price source (plain options written by the price
/// feed) and as the snapshot store (options with an expiry).
pub struct SqlxOptionStore {
    pool: AnyPool,
    clock: Arc<dyn Clock>,
}

impl SqlxOptionStore {
    pub fn new(pool: AnyPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Writes an option that never expires.
    pub async fn set_option(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.upsert(name, value, 0).await
    }

    /// Reads an option, ignoring it once expired.
    #[instrument(skip(self), target = "store", level = "debug")]
    pub async fn get_option(&self, name: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value, expires_at_ms FROM options WHERE name = ?;")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read option {name}"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at_ms: i64 = row.try_get("expires_at_ms")?;
        if expires_at_ms != 0 && expires_at_ms <= to_ms(self.clock.now()) {
            debug!(expires_at_ms, "option expired");
            return Ok(None);
        }

        Ok(Some(row.try_get("value")?))
    }

    async fn upsert(&self, name: &str, value: &str, expires_at_ms: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO options (name, value, expires_at_ms) VALUES (?, ?, ?)
ON CONFLICT (name) DO UPDATE SET value = excluded.value, expires_at_ms = excluded.expires_at_ms;
"#,
        )
        .bind(name)
        .bind(value)
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write option {name}"))?;

        Ok(())
    }
}

#[async_trait]
impl PriceSource for SqlxOptionStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.get_option(key).await
    }
}

#[async_trait]
impl SnapshotStore for SqlxOptionStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.get_option(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        let ttl = chrono::TimeDelta::from_std(ttl).context("ttl out of range")?;
        let expires_at_ms = to_ms(self.clock.now() + ttl);
        self.upsert(key, &value, expires_at_ms).await
    }
}
