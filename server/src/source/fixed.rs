use std::collections::HashMap;

use async_trait::async_trait;

use super::PriceSource;

/// In-process source over a fixed option map.
#[derive(Clone, Debug, Default)]
pub struct FixedPriceSource {
    options: HashMap<String, String>,
}

impl FixedPriceSource {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.options.get(key).cloned())
    }
}
