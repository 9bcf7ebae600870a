use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::SnapshotStore;
use crate::time::Clock;

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local store. Expired entries are dropped lazily on read.
pub struct InMemorySnapshotStore {
    clock: Arc<dyn Clock>,
    map: Mutex<HashMap<String, Entry>>,
}

impl InMemorySnapshotStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let now = self.clock.now();
        let mut map = self.map.lock();

        let live = map
            .get(key)
            .map(|e| (now < e.expires_at).then(|| e.value.clone()));

        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                map.remove(key);
                debug!(target: "store", key, "in-memory entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        let ttl = TimeDelta::from_std(ttl).context("ttl out of range")?;
        let expires_at = self.clock.now() + ttl;

        self.map
            .lock()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
