use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use metals::time::format_time_to_update;
use metals::{BootstrapData, Metal, PricePayload};
use metals_countdown::{
    Countdown, CountdownClient, CountdownError, Effect, Field, MemoryDisplay, PriceFetcher,
};
use tracing_test::traced_test;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 20, 15, 30, 0).unwrap()
}

fn payload(next: DateTime<Utc>) -> PricePayload {
    PricePayload {
        gold_price_gram: "gold gr".into(),
        silver_price_gram: "silver gr".into(),
        platinum_price_gram: "platinum gr".into(),
        palladium_price_gram: "palladium gr".into(),
        gold_price_ounce: "gold oz".into(),
        silver_price_ounce: "silver oz".into(),
        platinum_price_ounce: "platinum oz".into(),
        palladium_price_ounce: "palladium oz".into(),
        time_to_update: format_time_to_update(next),
        current_date: "2024-08-20 15:30".into(),
        generated_at: None,
    }
}

fn bootstrap(json: String, next_update: DateTime<Utc>, unit: &str) -> BootstrapData {
    BootstrapData {
        metal_price_json: json,
        next_update: format_time_to_update(next_update),
        price_unit_of_measure: unit.into(),
        ajax_url: "http://localhost:8080/wp-admin/admin-ajax.php".into(),
    }
}

/// Answers every fetch with a payload due at `next`.
struct ScriptedFetcher {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail_first: bool,
    next: DateTime<Utc>,
}

impl ScriptedFetcher {
    fn new(next: DateTime<Utc>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail_first: false,
            next,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_first(mut self) -> Self {
        self.fail_first = true;
        self
    }
}

#[async_trait]
impl PriceFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<PricePayload, CountdownError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_first && n == 0 {
            return Err(CountdownError::InvalidUrl("scripted failure".into()));
        }
        Ok(payload(self.next))
    }
}

#[tokio::test(start_paused = true)]
async fn empty_bootstrap_fetches_before_first_tick() {
    let data = bootstrap("{}".into(), start() + TimeDelta::minutes(5), "gr");
    let (state, first) = Countdown::boot(&data);
    assert_eq!(first, Effect::Refresh);

    let fetcher = ScriptedFetcher::new(start() + TimeDelta::minutes(5));
    let calls = fetcher.calls.clone();
    let mut client =
        CountdownClient::new(fetcher, MemoryDisplay::full_page(), state).with_start_time(start());

    client.run_for(first, Duration::from_millis(1_500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let page = client.display();
    assert_eq!(page.get(Field::Price(Metal::Gold)), Some("gold gr"));
    assert_eq!(page.get(Field::Price(Metal::Palladium)), Some("palladium gr"));
    assert_eq!(page.get(Field::CurrentDate), Some("2024-08-20 15:30"));
    assert_eq!(page.get(Field::Countdown), Some("4m 59s"));
}

#[tokio::test(start_paused = true)]
async fn embedded_payload_renders_without_fetching() {
    let next = start() + TimeDelta::minutes(3);
    let json = serde_json::to_string(&payload(next)).unwrap();
    let (state, first) = Countdown::boot(&bootstrap(json, next, "oz"));

    let fetcher = ScriptedFetcher::new(next);
    let calls = fetcher.calls.clone();
    let mut client =
        CountdownClient::new(fetcher, MemoryDisplay::full_page(), state).with_start_time(start());

    client.run_for(first, Duration::from_millis(3_500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.display().get(Field::Price(Metal::Silver)), Some("silver oz"));
    assert_eq!(client.display().get(Field::Countdown), Some("2m 57s"));
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_is_not_duplicated_by_later_ticks() {
    let expiring = start() + TimeDelta::seconds(2);
    let json = serde_json::to_string(&payload(expiring)).unwrap();
    let (state, first) = Countdown::boot(&bootstrap(json, expiring, "oz"));
    assert!(matches!(first, Effect::Update(_)));

    // Expires at 2s, response lands at 4.5s; ticks at 3s and 4s must not
    // start another request.
    let fetcher = ScriptedFetcher::new(start() + TimeDelta::minutes(5))
        .slow(Duration::from_millis(2_500));
    let calls = fetcher.calls.clone();
    let mut client =
        CountdownClient::new(fetcher, MemoryDisplay::full_page(), state).with_start_time(start());

    client.run_for(first, Duration::from_millis(5_500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.display().get(Field::Countdown), Some("4m 55s"));
    assert_eq!(client.state().target(), Some(start() + TimeDelta::minutes(5)));
}

#[tokio::test(start_paused = true)]
async fn unknown_unit_leaves_prices_untouched() {
    let data = bootstrap("{}".into(), start() + TimeDelta::minutes(5), "xx");
    let (state, first) = Countdown::boot(&data);

    let fetcher = ScriptedFetcher::new(start() + TimeDelta::minutes(5));
    let mut client =
        CountdownClient::new(fetcher, MemoryDisplay::full_page(), state).with_start_time(start());

    client.run_for(first, Duration::from_millis(1_500)).await;

    let page = client.display();
    for metal in Metal::ALL {
        assert_eq!(page.get(Field::Price(metal)), Some(""));
    }
    assert_eq!(page.get(Field::CurrentDate), Some("2024-08-20 15:30"));
    assert_eq!(page.get(Field::Countdown), Some("4m 59s"));
}

#[tokio::test(start_paused = true)]
async fn page_without_price_elements_still_counts_down() {
    let data = bootstrap("{}".into(), start() + TimeDelta::minutes(5), "oz");
    let (state, first) = Countdown::boot(&data);

    let fetcher = ScriptedFetcher::new(start() + TimeDelta::minutes(5));
    let page = MemoryDisplay::with_fields(&[Field::Countdown]);
    let mut client = CountdownClient::new(fetcher, page, state).with_start_time(start());

    client.run_for(first, Duration::from_millis(1_500)).await;

    assert_eq!(client.display().get(Field::Price(Metal::Gold)), None);
    assert_eq!(client.display().get(Field::Countdown), Some("4m 59s"));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn failed_refresh_is_retried_on_next_tick() {
    let data = bootstrap("{}".into(), start(), "oz");
    let (state, first) = Countdown::boot(&data);

    let fetcher = ScriptedFetcher::new(start() + TimeDelta::minutes(5)).failing_first();
    let calls = fetcher.calls.clone();
    let mut client =
        CountdownClient::new(fetcher, MemoryDisplay::full_page(), state).with_start_time(start());

    client.run_for(first, Duration::from_millis(2_500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(client.display().get(Field::Price(Metal::Gold)), Some("gold oz"));
    assert_eq!(client.display().get(Field::Countdown), Some("4m 58s"));
    assert!(logs_contain("price refresh failed"));
}
