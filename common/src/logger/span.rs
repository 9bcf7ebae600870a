use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one inbound request. `action` is recorded once known.
pub fn request_span(route: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "request",
        route = %route,
        trace_id = %trace_id,
        action = field::Empty
    )
}

/// Awaits `fut` and logs a warning on the `performance` target when it took
/// longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
