use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use metals::PricePayload;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::display::{Field, PriceDisplay};
use crate::error::CountdownError;
use crate::fetch::PriceFetcher;
use crate::state::{Countdown, Effect};

type FetchResult = Result<PricePayload, CountdownError>;

/// Drives a [`Countdown`] against a display.
///
/// Ticks once per second. Refreshes run as background tasks so a slow server
/// never delays the countdown; at most one is in flight, and a tick that
/// wants a refresh while one is running is a no-op.
pub struct CountdownClient<F, D> {
    fetcher: Arc<F>,
    display: D,
    state: Countdown,
    tick_every: Duration,
    in_flight: Option<JoinHandle<FetchResult>>,
    /// Wall-clock time at `epoch`. Elapsed time is taken from the tokio
    /// clock so a paused runtime drives the countdown.
    started_at: DateTime<Utc>,
    epoch: Instant,
}

impl<F, D> CountdownClient<F, D>
where
    F: PriceFetcher + 'static,
    D: PriceDisplay,
{
    pub fn new(fetcher: F, display: D, state: Countdown) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            display,
            state,
            tick_every: Duration::from_secs(1),
            in_flight: None,
            started_at: Utc::now(),
            epoch: Instant::now(),
        }
    }

    /// Pins the wall-clock time the client considers "now" at construction.
    pub fn with_start_time(mut self, t: DateTime<Utc>) -> Self {
        self.started_at = t;
        self.epoch = Instant::now();
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn state(&self) -> &Countdown {
        &self.state
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.epoch.elapsed()).unwrap_or(TimeDelta::zero());
        self.started_at + elapsed
    }

    /// Applies `first` (usually from [`Countdown::boot`]) and runs forever.
    pub async fn run(&mut self, first: Effect) {
        let mut ticker = interval_at(Instant::now() + self.tick_every, self.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            target: "countdown",
            every_ms = self.tick_every.as_millis(),
            target_at = ?self.state.target(),
            "countdown started"
        );

        self.handle(first);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let effect = self.state.tick(self.now());
                    self.handle(effect);
                }
                joined = join_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.on_fetched(joined);
                }
            }
        }
    }

    /// Runs for `duration`, then returns with the display as left.
    pub async fn run_for(&mut self, first: Effect, duration: Duration) {
        let _ = tokio::time::timeout(duration, self.run(first)).await;
    }

    fn handle(&mut self, effect: Effect) {
        match effect {
            Effect::ShowRemaining(text) => self.display.set_html(Field::Countdown, &text),
            Effect::Refresh => self.request_refresh(),
            Effect::Update(updates) => {
                for update in &updates {
                    self.display.set_html(update.field, &update.html);
                }
            }
        }
    }

    fn request_refresh(&mut self) {
        if self.in_flight.is_some() {
            debug!(target: "countdown", "refresh already in flight");
            return;
        }

        let fetcher = Arc::clone(&self.fetcher);
        self.in_flight = Some(tokio::spawn(async move { fetcher.fetch().await }));
    }

    fn on_fetched(&mut self, joined: Result<FetchResult, JoinError>) {
        match joined {
            Ok(Ok(payload)) => {
                if let Some(updates) = self.state.apply(&payload) {
                    info!(
                        target: "countdown",
                        time_to_update = %payload.time_to_update,
                        "prices refreshed"
                    );
                    self.handle(Effect::Update(updates));
                }
            }
            Ok(Err(e)) => {
                warn!(target: "countdown", error = %e, "price refresh failed; retrying on next tick");
            }
            Err(e) => {
                warn!(target: "countdown", error = %e, "price refresh task aborted");
            }
        }
    }
}

async fn join_in_flight(
    handle: &mut Option<JoinHandle<FetchResult>>,
) -> Result<FetchResult, JoinError> {
    match handle {
        Some(h) => h.await,
        None => std::future::pending().await,
    }
}
