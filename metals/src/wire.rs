//! JSON shapes exchanged with the page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetalsError;
use crate::time::parse_time_to_update;
use crate::types::{Metal, UnitOfMeasure};

/// Refresh endpoint response, also the cached representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePayload {
    pub gold_price_gram: String,
    pub silver_price_gram: String,
    pub platinum_price_gram: String,
    pub palladium_price_gram: String,
    pub gold_price_ounce: String,
    pub silver_price_ounce: String,
    pub platinum_price_ounce: String,
    pub palladium_price_ounce: String,
    pub time_to_update: String,
    pub current_date: String,
    /// RFC 3339 computation time. Ignored by the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl PricePayload {
    pub fn price(&self, metal: Metal, unit: UnitOfMeasure) -> &str {
        match (unit, metal) {
            (UnitOfMeasure::Gram, Metal::Gold) => &self.gold_price_gram,
            (UnitOfMeasure::Gram, Metal::Silver) => &self.silver_price_gram,
            (UnitOfMeasure::Gram, Metal::Platinum) => &self.platinum_price_gram,
            (UnitOfMeasure::Gram, Metal::Palladium) => &self.palladium_price_gram,
            (UnitOfMeasure::Ounce, Metal::Gold) => &self.gold_price_ounce,
            (UnitOfMeasure::Ounce, Metal::Silver) => &self.silver_price_ounce,
            (UnitOfMeasure::Ounce, Metal::Platinum) => &self.platinum_price_ounce,
            (UnitOfMeasure::Ounce, Metal::Palladium) => &self.palladium_price_ounce,
        }
    }

    /// Absolute time the server considers this payload stale.
    pub fn next_update(&self) -> Result<DateTime<Utc>, MetalsError> {
        parse_time_to_update(&self.time_to_update)
    }

    /// Decodes the JSON embedded in the page. `{}`, partial or malformed
    /// JSON all mean "nothing cached yet".
    pub fn from_embedded(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// Data embedded into the page at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapData {
    /// Cached payload as a JSON string, `{}` when nothing is cached.
    pub metal_price_json: String,
    /// Countdown target when the page starts.
    pub next_update: String,
    /// `oz` or `gr`; passed through verbatim.
    pub price_unit_of_measure: String,
    /// Absolute URL of the refresh endpoint.
    pub ajax_url: String,
}
