use chrono::{DateTime, Utc};
use metals::time::parse_time_to_update;
use metals::{BootstrapData, Metal, PricePayload, UnitOfMeasure};
use tracing::{debug, warn};

use crate::display::{DomUpdate, Field};

/// What the driver should do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the remaining time into the countdown field.
    ShowRemaining(String),
    /// Ask the server for a fresh payload.
    Refresh,
    /// Write a received payload into the page.
    Update(Vec<DomUpdate>),
}

/// `"<m>m <s>s"`, minutes taken modulo the hour.
pub fn format_remaining(remaining_ms: i64) -> String {
    let minutes = (remaining_ms % 3_600_000) / 60_000;
    let seconds = (remaining_ms % 60_000) / 1_000;
    format!("{minutes}m {seconds}s")
}

/// Countdown towards the server-declared refresh time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    /// `None` for an unrecognized unit: prices are then never written.
    unit: Option<UnitOfMeasure>,
    target: Option<DateTime<Utc>>,
    /// Deadline of the last payload written to the page. Responses are
    /// ordered against this, not against a bootstrap fallback target.
    last_applied: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new(price_unit_of_measure: &str, target: Option<DateTime<Utc>>) -> Self {
        let unit = UnitOfMeasure::parse(price_unit_of_measure);
        if unit.is_none() {
            warn!(
                target: "countdown",
                unit = price_unit_of_measure,
                "unrecognized unit of measure; prices will not be displayed"
            );
        }
        Self {
            unit,
            target,
            last_applied: None,
        }
    }

    /// Starts from page bootstrap data.
    ///
    /// An embedded payload is rendered straight away; without one (or with
    /// one that cannot be read) the first effect is a refresh.
    pub fn boot(data: &BootstrapData) -> (Self, Effect) {
        let target = parse_time_to_update(&data.next_update)
            .map_err(|e| debug!(target: "countdown", error = %e, "bootstrap has no usable next_update"))
            .ok();
        let mut state = Self::new(&data.price_unit_of_measure, target);

        let effect = match PricePayload::from_embedded(&data.metal_price_json) {
            Some(payload) => match state.apply(&payload) {
                Some(updates) => Effect::Update(updates),
                None => Effect::Refresh,
            },
            None => Effect::Refresh,
        };

        (state, effect)
    }

    pub fn unit(&self) -> Option<UnitOfMeasure> {
        self.unit
    }

    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.target
    }

    /// One-second tick. Refreshes once the target is reached; the state only
    /// changes when a response is applied.
    pub fn tick(&self, now: DateTime<Utc>) -> Effect {
        let Some(target) = self.target else {
            return Effect::Refresh;
        };

        let remaining_ms = (target - now).num_milliseconds();
        if remaining_ms <= 0 {
            Effect::Refresh
        } else {
            Effect::ShowRemaining(format_remaining(remaining_ms))
        }
    }

    /// Applies a refresh response and returns the page writes.
    ///
    /// Returns `None` and leaves the state untouched when the response is
    /// older than the payload already on the page (an overtaken request) or
    /// carries no readable refresh time. Until a payload has been applied
    /// any readable response is accepted.
    pub fn apply(&mut self, payload: &PricePayload) -> Option<Vec<DomUpdate>> {
        let next = match payload.next_update() {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "countdown", error = %e, "ignoring response without refresh time");
                return None;
            }
        };

        if let Some(shown) = self.last_applied {
            if next < shown {
                debug!(target: "countdown", %next, %shown, "discarding overtaken response");
                return None;
            }
        }
        self.target = Some(next);
        self.last_applied = Some(next);

        let mut updates = Vec::with_capacity(Metal::ALL.len() + 1);
        if let Some(unit) = self.unit {
            updates.extend(
                Metal::ALL
                    .into_iter()
                    .map(|m| DomUpdate::new(Field::Price(m), payload.price(m, unit))),
            );
        }
        updates.push(DomUpdate::new(Field::CurrentDate, payload.current_date.as_str()));

        Some(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use metals::time::format_time_to_update;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn payload(next: DateTime<Utc>) -> PricePayload {
        PricePayload {
            gold_price_gram: "g-gr".into(),
            silver_price_gram: "s-gr".into(),
            platinum_price_gram: "p-gr".into(),
            palladium_price_gram: "d-gr".into(),
            gold_price_ounce: "g-oz".into(),
            silver_price_ounce: "s-oz".into(),
            platinum_price_ounce: "p-oz".into(),
            palladium_price_ounce: "d-oz".into(),
            time_to_update: format_time_to_update(next),
            current_date: "2024-09-01 12:00".into(),
            generated_at: None,
        }
    }

    fn bootstrap(json: &str, next_update: &str, unit: &str) -> BootstrapData {
        BootstrapData {
            metal_price_json: json.into(),
            next_update: next_update.into(),
            price_unit_of_measure: unit.into(),
            ajax_url: "http://localhost/ajax".into(),
        }
    }

    #[test]
    fn remaining_is_minutes_and_seconds() {
        assert_eq!(format_remaining(65_000), "1m 5s");
        assert_eq!(format_remaining(299_999), "4m 59s");
        assert_eq!(format_remaining(999), "0m 0s");
        // Whole hours are not shown.
        assert_eq!(format_remaining(3_725_000), "2m 5s");
    }

    #[test]
    fn tick_renders_until_target() {
        let c = Countdown::new("oz", Some(t0() + TimeDelta::seconds(65)));

        assert_eq!(c.tick(t0()), Effect::ShowRemaining("1m 5s".into()));
        assert_eq!(
            c.tick(t0() + TimeDelta::seconds(64)),
            Effect::ShowRemaining("0m 1s".into())
        );
    }

    #[test]
    fn reaching_target_refreshes_instead_of_zero() {
        let c = Countdown::new("oz", Some(t0()));

        assert_eq!(c.tick(t0()), Effect::Refresh);
        assert_eq!(c.tick(t0() + TimeDelta::seconds(3)), Effect::Refresh);
    }

    #[test]
    fn tick_is_pure() {
        let c = Countdown::new("gr", Some(t0()));
        let before = c.clone();

        let _ = c.tick(t0() + TimeDelta::seconds(10));

        assert_eq!(c, before);
    }

    #[test]
    fn missing_target_refreshes() {
        let c = Countdown::new("oz", None);
        assert_eq!(c.tick(t0()), Effect::Refresh);
    }

    #[test]
    fn boot_without_cache_refreshes_immediately() {
        let (c, effect) = Countdown::boot(&bootstrap("{}", "2024-09-01 12:05:00+0000", "oz"));

        assert_eq!(effect, Effect::Refresh);
        assert_eq!(c.target(), Some(t0() + TimeDelta::minutes(5)));
    }

    #[test]
    fn boot_with_malformed_cache_refreshes() {
        let (_, effect) = Countdown::boot(&bootstrap("{\"gold", "2024-09-01 12:05:00+0000", "oz"));
        assert_eq!(effect, Effect::Refresh);

        let (c, effect) = Countdown::boot(&bootstrap("{}", "", "oz"));
        assert_eq!(effect, Effect::Refresh);
        assert_eq!(c.target(), None);
    }

    #[test]
    fn boot_with_cache_renders_it() {
        let next = t0() + TimeDelta::minutes(3);
        let json = serde_json::to_string(&payload(next)).unwrap();

        let (c, effect) = Countdown::boot(&bootstrap(&json, &format_time_to_update(next), "oz"));

        assert_eq!(c.target(), Some(next));
        let Effect::Update(updates) = effect else {
            panic!("expected page update, got {effect:?}");
        };
        assert!(updates.contains(&DomUpdate::new(Field::Price(Metal::Gold), "g-oz")));
        assert!(updates.contains(&DomUpdate::new(Field::CurrentDate, "2024-09-01 12:00")));
    }

    #[test]
    fn gram_unit_selects_gram_fields() {
        let mut c = Countdown::new("gr", None);
        let updates = c.apply(&payload(t0())).unwrap();

        assert_eq!(
            updates,
            vec![
                DomUpdate::new(Field::Price(Metal::Gold), "g-gr"),
                DomUpdate::new(Field::Price(Metal::Silver), "s-gr"),
                DomUpdate::new(Field::Price(Metal::Platinum), "p-gr"),
                DomUpdate::new(Field::Price(Metal::Palladium), "d-gr"),
                DomUpdate::new(Field::CurrentDate, "2024-09-01 12:00"),
            ]
        );
    }

    #[test]
    fn unknown_unit_updates_only_the_date() {
        let mut c = Countdown::new("xx", Some(t0()));
        assert_eq!(c.unit(), None);

        let updates = c.apply(&payload(t0() + TimeDelta::minutes(5))).unwrap();

        assert_eq!(updates, vec![DomUpdate::new(Field::CurrentDate, "2024-09-01 12:00")]);
        assert_eq!(c.target(), Some(t0() + TimeDelta::minutes(5)));
        assert_eq!(
            c.tick(t0() + TimeDelta::minutes(4)),
            Effect::ShowRemaining("1m 0s".into())
        );
    }

    #[test]
    fn overtaken_response_is_discarded() {
        let mut c = Countdown::new("oz", None);
        let newer = t0() + TimeDelta::minutes(10);
        let older = t0() + TimeDelta::minutes(5);

        assert!(c.apply(&payload(newer)).is_some());
        assert!(c.apply(&payload(older)).is_none());
        assert_eq!(c.target(), Some(newer));

        // Same deadline again is accepted.
        assert!(c.apply(&payload(newer)).is_some());
    }

    #[test]
    fn first_response_beats_bootstrap_fallback() {
        // Nothing cached at render time; another request computed the
        // snapshot just before, so its deadline precedes the fallback.
        let (mut c, effect) = Countdown::boot(&bootstrap("{}", "2024-09-01 12:05:00+0000", "oz"));
        assert_eq!(effect, Effect::Refresh);

        let earlier = t0() + TimeDelta::seconds(4 * 60 + 58);
        let updates = c.apply(&payload(earlier)).unwrap();

        assert!(updates.contains(&DomUpdate::new(Field::Price(Metal::Gold), "g-oz")));
        assert_eq!(c.target(), Some(earlier));
        assert_eq!(
            c.tick(t0() + TimeDelta::seconds(1)),
            Effect::ShowRemaining("4m 57s".into())
        );
    }

    #[test]
    fn embedded_payload_orders_later_responses() {
        let next = t0() + TimeDelta::minutes(3);
        let json = serde_json::to_string(&payload(next)).unwrap();
        let (mut c, _) = Countdown::boot(&bootstrap(&json, &format_time_to_update(next), "oz"));

        assert!(c.apply(&payload(next - TimeDelta::seconds(1))).is_none());
        assert!(c.apply(&payload(next + TimeDelta::minutes(5))).is_some());
    }

    #[test]
    fn unreadable_refresh_time_is_ignored() {
        let mut c = Countdown::new("oz", Some(t0()));
        let mut p = payload(t0());
        p.time_to_update = "2024".into();

        assert!(c.apply(&p).is_none());
        assert_eq!(c.target(), Some(t0()));
    }
}
