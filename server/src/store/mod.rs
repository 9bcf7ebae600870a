//! Shared, time-bounded key-value store holding the active snapshot.

mod memory;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::InMemorySnapshotStore;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns the value unless it is absent or its TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites `key`; the value disappears `ttl` after this call.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}
