use std::fmt;

use serde::{Deserialize, Serialize};

/// Metals shown on the price strip, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
    Platinum,
    Palladium,
}

impl Metal {
    pub const ALL: [Metal; 4] = [Metal::Gold, Metal::Silver, Metal::Platinum, Metal::Palladium];

    pub fn name(self) -> &'static str {
        match self {
            Metal::Gold => "gold",
            Metal::Silver => "silver",
            Metal::Platinum => "platinum",
            Metal::Palladium => "palladium",
        }
    }

    /// Source key holding the current price of one gram.
    pub fn price_key(self) -> String {
        format!("ign_{}_price", self.name())
    }

    /// Source key holding the last known price before the current one.
    pub fn history_key(self) -> String {
        format!("ign_{}_price_history", self.name())
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of the latest price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// A price that did not fall counts as up, including against a missing
    /// (zero) baseline.
    pub fn between(current: f64, previous: f64) -> Self {
        if current >= previous {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Trend::Up => '▲',
            Trend::Down => '▼',
        }
    }

    /// Glyph wrapped in a span so page CSS can colour it.
    pub fn markup(self) -> &'static str {
        match self {
            Trend::Up => r#"<span class="up_arrow">▲</span>"#,
            Trend::Down => r#"<span class="down_arrow">▼</span>"#,
        }
    }
}

/// Unit a price is quoted per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOfMeasure {
    /// Troy ounce, `oz`.
    Ounce,
    /// Gram, `gr`.
    Gram,
}

impl UnitOfMeasure {
    /// Strict parse: only `oz` and `gr` are recognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "oz" => Some(UnitOfMeasure::Ounce),
            "gr" => Some(UnitOfMeasure::Gram),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnitOfMeasure::Ounce => "oz",
            UnitOfMeasure::Gram => "gr",
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Raw per-gram price read from the price source for one metal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPriceReading {
    pub current: f64,
    /// Last known price before `current`. `None` when never recorded.
    pub previous: Option<f64>,
}

impl RawPriceReading {
    pub fn new(current: f64, previous: Option<f64>) -> Self {
        Self { current, previous }
    }

    pub fn trend(&self) -> Trend {
        Trend::between(self.current, self.previous.unwrap_or(0.0))
    }
}
