use std::sync::Arc;

use anyhow::Context;
use common::init_tracing;
use metals_server::{
    cache::PriceCache,
    config::{AppConfig, CacheBackend},
    db::{Db, SqlxOptionStore},
    http::{AppState, router},
    source::PriceSource,
    store::{InMemorySnapshotStore, SnapshotStore},
    time::{Clock, SystemClock},
};

/// Connects the options database and picks the snapshot store.
async fn init_backends(
    cfg: &AppConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<(Arc<dyn SnapshotStore>, Arc<dyn PriceSource>)> {
    let db = Db::connect(&cfg.database_url)
        .await
        .with_context(|| format!("failed to connect {}", cfg.database_url))?;
    db.migrate().await.context("failed to migrate options table")?;

    let options = Arc::new(SqlxOptionStore::new(db.pool.clone(), clock.clone()));

    let store: Arc<dyn SnapshotStore> = match cfg.cache_backend {
        CacheBackend::Sql => options.clone(),
        CacheBackend::Memory => Arc::new(InMemorySnapshotStore::new(clock)),
    };

    let source: Arc<dyn PriceSource> = options;
    Ok((store, source))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    let cfg = AppConfig::from_env()?;
    tracing::info!(
        bind_addr = %cfg.bind_addr,
        refresh_secs = cfg.refresh_interval.num_seconds(),
        cache_backend = ?cfg.cache_backend,
        "Starting metals price server..."
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (store, source) = init_backends(&cfg, clock.clone()).await?;

    let cache = PriceCache::new(store, source, clock, cfg.price_computer())
        .with_fallback_symbol(cfg.currency_symbol.clone());

    let state = AppState {
        cache: Arc::new(cache),
        price_unit_of_measure: cfg.price_unit_of_measure.as_str().into(),
        ajax_url: cfg.ajax_url().into(),
    };
    let app = router(state, &cfg.ajax_path);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
