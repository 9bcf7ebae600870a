//! Raw price readings from the external key-value source.

mod fixed;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use common::warn_if_slow;
use metals::{Metal, RawPriceReading};
use tracing::{debug, instrument, warn};

pub use fixed::FixedPriceSource;

/// Key holding the shop's currency symbol.
pub const CURRENCY_SYMBOL_KEY: &str = "currency_symbol";

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Raw value stored under `key`, `None` when unset.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    async fn currency_symbol(&self) -> Result<Option<String>> {
        self.read(CURRENCY_SYMBOL_KEY).await
    }
}

/// Lenient float cast: the longest leading decimal number is used, so
/// `"61.25 USD"` reads as `61.25`. No leading number, or a non-finite one,
/// reads as `0.0`.
pub fn parse_price(raw: &str) -> f64 {
    let s = raw.trim_start();
    let end = numeric_prefix_len(s.as_bytes());
    if end == 0 {
        return 0.0;
    }
    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Length of `[+-]digits[.digits][(e|E)[+-]digits]` at the start of `b`,
/// `0` when no digit is present.
fn numeric_prefix_len(b: &[u8]) -> usize {
    let digits_at = |from: usize| {
        b.get(from..)
            .map_or(0, |t| t.iter().take_while(|c| c.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_digits = digits_at(end);
    end += int_digits;

    let mut frac_digits = 0;
    if b.get(end) == Some(&b'.') {
        frac_digits = digits_at(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_at(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    end
}

async fn read_price(source: &dyn PriceSource, key: &str) -> Option<f64> {
    match warn_if_slow("price_source_read", Duration::from_millis(100), source.read(key)).await {
        Ok(Some(raw)) => Some(parse_price(&raw)),
        Ok(None) => {
            debug!(target: "source", key, "price option unset");
            None
        }
        Err(e) => {
            warn!(target: "source", key, error = ?e, "price source read failed; using 0");
            None
        }
    }
}

/// Reads current and previous prices for every metal. Never fails: unset or
/// unreadable current prices become `0.0`, previous prices become absent.
#[instrument(skip(source), target = "source")]
pub async fn read_readings(source: &dyn PriceSource) -> HashMap<Metal, RawPriceReading> {
    let mut out = HashMap::with_capacity(Metal::ALL.len());

    for metal in Metal::ALL {
        let current = match read_price(source, &metal.price_key()).await {
            Some(v) => v,
            None => {
                warn!(target: "source", %metal, "no current price; displaying 0");
                0.0
            }
        };
        let previous = read_price(source, &metal.history_key()).await;

        out.insert(metal, RawPriceReading::new(current, previous));
    }

    out
}
