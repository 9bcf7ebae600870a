use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Plain fmt subscriber for small binaries. Safe to call more than once.
pub fn init_logger(service_name: &'static str) {
    LOGGER_INIT.get_or_init(|| {
        fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true)
            .init();

        tracing::info!(service = service_name, "logger initialized");
    });
}

/// Service subscriber: pretty output for development, JSON lines in production.
///
/// Span close events are emitted so request and recompute timings show up
/// without extra instrumentation.
pub fn init_tracing(json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let base = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        if json {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(base.json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(base.pretty())
                .init();
        }
    });
}
