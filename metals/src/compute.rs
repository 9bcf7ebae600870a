use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Offset, SubsecRound, TimeDelta, Utc};

use crate::snapshot::{MetalPrices, PriceSnapshot};
use crate::time::format_display_date;
use crate::types::{Metal, RawPriceReading, Trend, UnitOfMeasure};

/// Grams per troy ounce.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1035;

/// Derived prices for one metal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetalQuote {
    pub trend: Trend,
    pub gram_price: f64,
    pub ounce_price: f64,
}

/// Rounds to two decimal places, half away from zero.
///
/// The scaled value is first cut to 15 significant digits, so inputs such as
/// `1.005` (stored as `1.00499..`) round up the way a decimal reader expects.
pub fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if !scaled.is_finite() {
        return v;
    }
    let pre = format!("{scaled:.14e}").parse::<f64>().unwrap_or(scaled);
    let rounded = pre.round() / 100.0;
    // No "-0" on the page.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Per-metal derivation. Each metal gets its own trend; nothing is shared
/// between metals.
pub fn quote(reading: &RawPriceReading) -> MetalQuote {
    MetalQuote {
        trend: reading.trend(),
        gram_price: round2(reading.current),
        ounce_price: round2(reading.current * GRAMS_PER_TROY_OUNCE),
    }
}

/// `"<price> <symbol>/<unit> <glyph>"`. The price is printed in its shortest
/// form, so `75.1` and `1900` carry no trailing zeros.
pub fn format_price(price: f64, symbol: &str, unit: UnitOfMeasure, trend: Trend) -> String {
    format!("{} {}/{} {}", round2(price), symbol, unit, trend.markup())
}

/// Turns raw readings into an immutable [`PriceSnapshot`].
#[derive(Debug, Clone)]
pub struct PriceComputer {
    refresh_interval: TimeDelta,
    display_offset: FixedOffset,
}

impl PriceComputer {
    pub const DEFAULT_REFRESH_SECS: i64 = 5 * 60;

    pub fn new(refresh_interval: TimeDelta) -> Self {
        Self {
            refresh_interval,
            display_offset: Utc.fix(),
        }
    }

    /// Offset applied to `currentDate`; timestamps stay UTC.
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    pub fn refresh_interval(&self) -> TimeDelta {
        self.refresh_interval
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Metals absent from `readings` are priced at `0.0` so one unconfigured
    /// metal never blanks the whole strip.
    pub fn compute(
        &self,
        readings: &HashMap<Metal, RawPriceReading>,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> PriceSnapshot {
        // Wire timestamps carry whole seconds.
        let generated_at = now.trunc_subsecs(0);

        let quote_for = |m: Metal| quote(&readings.get(&m).copied().unwrap_or_default());

        let per_gram = MetalPrices::from_fn(|m| {
            let q = quote_for(m);
            format_price(q.gram_price, symbol, UnitOfMeasure::Gram, q.trend)
        });
        let per_ounce = MetalPrices::from_fn(|m| {
            let q = quote_for(m);
            format_price(q.ounce_price, symbol, UnitOfMeasure::Ounce, q.trend)
        });

        PriceSnapshot::new(
            per_gram,
            per_ounce,
            generated_at,
            generated_at + self.refresh_interval,
            format_display_date(generated_at, self.display_offset),
        )
    }
}

impl Default for PriceComputer {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(Self::DEFAULT_REFRESH_SECS))
    }
}
