use chrono::{DateTime, Utc};

use crate::error::MetalsError;
use crate::time::{format_time_to_update, parse_time_to_update};
use crate::types::{Metal, UnitOfMeasure};
use crate::wire::PricePayload;

/// Formatted display strings for every metal in one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetalPrices {
    pub gold: String,
    pub silver: String,
    pub platinum: String,
    pub palladium: String,
}

impl MetalPrices {
    pub fn from_fn(mut f: impl FnMut(Metal) -> String) -> Self {
        Self {
            gold: f(Metal::Gold),
            silver: f(Metal::Silver),
            platinum: f(Metal::Platinum),
            palladium: f(Metal::Palladium),
        }
    }

    pub fn get(&self, metal: Metal) -> &str {
        match metal {
            Metal::Gold => &self.gold,
            Metal::Silver => &self.silver,
            Metal::Platinum => &self.platinum,
            Metal::Palladium => &self.palladium,
        }
    }
}

/// Immutable bundle of displayable prices plus its refresh window.
///
/// Only [`crate::PriceComputer`] and the wire decoder create snapshots; a
/// refresh always produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSnapshot {
    per_gram: MetalPrices,
    per_ounce: MetalPrices,
    generated_at: DateTime<Utc>,
    next_refresh_at: DateTime<Utc>,
    current_date: String,
}

impl PriceSnapshot {
    pub(crate) fn new(
        per_gram: MetalPrices,
        per_ounce: MetalPrices,
        generated_at: DateTime<Utc>,
        next_refresh_at: DateTime<Utc>,
        current_date: String,
    ) -> Self {
        Self {
            per_gram,
            per_ounce,
            generated_at,
            next_refresh_at,
            current_date,
        }
    }

    pub fn per_gram(&self) -> &MetalPrices {
        &self.per_gram
    }

    pub fn per_ounce(&self) -> &MetalPrices {
        &self.per_ounce
    }

    pub fn prices(&self, unit: UnitOfMeasure) -> &MetalPrices {
        match unit {
            UnitOfMeasure::Gram => &self.per_gram,
            UnitOfMeasure::Ounce => &self.per_ounce,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn next_refresh_at(&self) -> DateTime<Utc> {
        self.next_refresh_at
    }

    /// Display string of `generated_at` in site-local time.
    pub fn current_date(&self) -> &str {
        &self.current_date
    }

    /// Servable iff `now < next_refresh_at`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.next_refresh_at
    }

    pub fn to_payload(&self) -> PricePayload {
        PricePayload {
            gold_price_gram: self.per_gram.gold.clone(),
            silver_price_gram: self.per_gram.silver.clone(),
            platinum_price_gram: self.per_gram.platinum.clone(),
            palladium_price_gram: self.per_gram.palladium.clone(),
            gold_price_ounce: self.per_ounce.gold.clone(),
            silver_price_ounce: self.per_ounce.silver.clone(),
            platinum_price_ounce: self.per_ounce.platinum.clone(),
            palladium_price_ounce: self.per_ounce.palladium.clone(),
            time_to_update: format_time_to_update(self.next_refresh_at),
            current_date: self.current_date.clone(),
            generated_at: Some(self.generated_at.to_rfc3339()),
        }
    }

    pub fn to_json(&self) -> Result<String, MetalsError> {
        Ok(serde_json::to_string(&self.to_payload())?)
    }

    pub fn from_json(json: &str) -> Result<Self, MetalsError> {
        serde_json::from_str::<PricePayload>(json)?.try_into()
    }
}

impl TryFrom<PricePayload> for PriceSnapshot {
    type Error = MetalsError;

    fn try_from(p: PricePayload) -> Result<Self, Self::Error> {
        let next_refresh_at = parse_time_to_update(&p.time_to_update)?;
        let generated_at = p
            .generated_at
            .as_deref()
            .ok_or(MetalsError::MissingField("generatedAt"))
            .and_then(parse_time_to_update)?;

        Ok(Self {
            per_gram: MetalPrices {
                gold: p.gold_price_gram,
                silver: p.silver_price_gram,
                platinum: p.platinum_price_gram,
                palladium: p.palladium_price_gram,
            },
            per_ounce: MetalPrices {
                gold: p.gold_price_ounce,
                silver: p.silver_price_ounce,
                platinum: p.platinum_price_ounce,
                palladium: p.palladium_price_ounce,
            },
            generated_at,
            next_refresh_at,
            current_date: p.current_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::PriceComputer;
    use crate::types::RawPriceReading;
    use chrono::{TimeDelta, TimeZone};
    use std::collections::HashMap;

    fn sample() -> PriceSnapshot {
        let mut r = HashMap::new();
        r.insert(Metal::Gold, RawPriceReading::new(61.5, Some(61.0)));
        r.insert(Metal::Silver, RawPriceReading::new(0.74, Some(0.75)));
        PriceComputer::default().compute(&r, "$", Utc.with_ymd_and_hms(2024, 2, 2, 8, 15, 0).unwrap())
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let s = sample();
        let edge = s.next_refresh_at();

        assert!(s.is_fresh(edge - TimeDelta::seconds(1)));
        assert!(!s.is_fresh(edge));
        assert!(!s.is_fresh(edge + TimeDelta::seconds(1)));
    }

    #[test]
    fn prices_selects_unit() {
        let s = sample();

        assert!(s.prices(UnitOfMeasure::Gram).gold.contains("/gr"));
        assert!(s.prices(UnitOfMeasure::Ounce).gold.contains("/oz"));
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let s = sample();
        let back = PriceSnapshot::from_json(&s.to_json().unwrap()).unwrap();

        assert_eq!(back, s);
    }

    #[test]
    fn payload_without_generated_at_is_rejected() {
        let mut p = sample().to_payload();
        p.generated_at = None;

        let err = PriceSnapshot::try_from(p).unwrap_err();
        assert!(matches!(err, MetalsError::MissingField("generatedAt")));
    }

    #[test]
    fn empty_object_is_malformed() {
        assert!(matches!(PriceSnapshot::from_json("{}"), Err(MetalsError::Payload(_))));
    }
}
