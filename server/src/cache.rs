use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::warn_if_slow;
use metals::time::{format_display_date, format_time_to_update};
use metals::{BootstrapData, CACHE_KEY, PricePayload, PriceComputer, PriceSnapshot};
use tracing::{debug, info, instrument, warn};

use crate::source::{PriceSource, read_readings};
use crate::store::SnapshotStore;
use crate::time::Clock;

/// Time-boxed cache over the price computation.
///
/// Serves the stored snapshot while `now < next_refresh_at`, otherwise
/// recomputes and overwrites it. Concurrent misses may each recompute; the
/// last write wins and every writer produces an equivalent snapshot.
pub struct PriceCache {
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    computer: PriceComputer,
    fallback_symbol: String,
}

impl PriceCache {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        computer: PriceComputer,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            computer,
            fallback_symbol: "$".to_string(),
        }
    }

    /// Symbol used when the source has none configured.
    pub fn with_fallback_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.fallback_symbol = symbol.into();
        self
    }

    /// Returns the active snapshot, recomputing it when stale or missing.
    #[instrument(skip(self), target = "cache")]
    pub async fn get(&self) -> PriceSnapshot {
        let now = self.clock.now();

        match self.cached().await {
            Some(snap) if snap.is_fresh(now) => {
                debug!(next_refresh_at = %snap.next_refresh_at(), "serving cached snapshot");
                snap
            }
            Some(snap) => {
                debug!(next_refresh_at = %snap.next_refresh_at(), "cached snapshot is stale");
                self.refresh(now).await
            }
            None => self.refresh(now).await,
        }
    }

    /// Computes a new snapshot at `now` and stores it for one refresh interval.
    #[instrument(skip(self), target = "cache")]
    pub async fn refresh(&self, now: DateTime<Utc>) -> PriceSnapshot {
        let readings = read_readings(self.source.as_ref()).await;
        let symbol = self.symbol().await;

        let snap = self.computer.compute(&readings, &symbol, now);

        match snap.to_json() {
            Ok(json) => {
                let ttl = self.ttl();
                let write = warn_if_slow(
                    "snapshot_store_set",
                    Duration::from_millis(50),
                    self.store.set(CACHE_KEY, json, ttl),
                )
                .await;
                if let Err(e) = write {
                    warn!(error = ?e, "failed to persist snapshot; serving it uncached");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode snapshot; serving it uncached"),
        }

        info!(
            generated_at = %snap.generated_at(),
            next_refresh_at = %snap.next_refresh_at(),
            "price snapshot recomputed"
        );
        snap
    }

    /// Data embedded into the page at render time.
    ///
    /// A cached payload is embedded as-is with `currentDate` moved to now and
    /// its own `timeToUpdate` as the countdown target. Without one the page
    /// gets `{}` and a target one interval away, and fetches on load.
    #[instrument(skip(self), target = "cache")]
    pub async fn bootstrap(&self, price_unit_of_measure: &str, ajax_url: &str) -> BootstrapData {
        let now = self.clock.now();

        let cached = self
            .cached_raw()
            .await
            .and_then(|raw| PricePayload::from_embedded(&raw));

        let (metal_price_json, next_update) = match cached {
            Some(mut payload) => {
                payload.current_date = format_display_date(now, self.computer.display_offset());
                let next_update = payload.time_to_update.clone();
                match serde_json::to_string(&payload) {
                    Ok(json) => (json, next_update),
                    Err(e) => {
                        warn!(error = %e, "failed to re-encode cached payload");
                        self.empty_bootstrap(now)
                    }
                }
            }
            None => self.empty_bootstrap(now),
        };

        BootstrapData {
            metal_price_json,
            next_update,
            price_unit_of_measure: price_unit_of_measure.to_string(),
            ajax_url: ajax_url.to_string(),
        }
    }

    fn empty_bootstrap(&self, now: DateTime<Utc>) -> (String, String) {
        (
            "{}".to_string(),
            format_time_to_update(now + self.computer.refresh_interval()),
        )
    }

    fn ttl(&self) -> Duration {
        self.computer
            .refresh_interval()
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    async fn symbol(&self) -> String {
        match self.source.currency_symbol().await {
            Ok(Some(s)) if !s.is_empty() => s,
            Ok(_) => self.fallback_symbol.clone(),
            Err(e) => {
                warn!(error = ?e, "currency symbol lookup failed; using fallback");
                self.fallback_symbol.clone()
            }
        }
    }

    async fn cached(&self) -> Option<PriceSnapshot> {
        let raw = self.cached_raw().await?;

        match PriceSnapshot::from_json(&raw) {
            Ok(snap) => Some(snap),
            Err(e) => {
                warn!(error = %e, "discarding malformed cached snapshot");
                None
            }
        }
    }

    /// Store read failures count as a miss.
    async fn cached_raw(&self) -> Option<String> {
        let read = warn_if_slow(
            "snapshot_store_get",
            Duration::from_millis(50),
            self.store.get(CACHE_KEY),
        )
        .await;

        match read {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = ?e, "snapshot store read failed; treating as miss");
                None
            }
        }
    }
}
