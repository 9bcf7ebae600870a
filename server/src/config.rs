use std::net::SocketAddr;

use chrono::{FixedOffset, TimeDelta};
use metals::PriceComputer;

use crate::error::AppError;

/// Where the active snapshot is cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    /// Options table in `database_url`; survives restarts and is shared
    /// between server processes.
    Sql,
    /// Process-local map; lost on restart.
    Memory,
}

impl CacheBackend {
    fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "sql" => Ok(CacheBackend::Sql),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(AppError::config(
                "CACHE_BACKEND",
                format!("expected `sql` or `memory`, got {other:?}"),
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP listen address.
    pub bind_addr: SocketAddr,

    /// Database holding the price options and, with [`CacheBackend::Sql`],
    /// the cached snapshot.
    pub database_url: String,

    pub cache_backend: CacheBackend,

    // =========================
    // Refresh cycle
    // =========================
    /// Lifetime of a computed snapshot. Also the store TTL and the distance
    /// between `generatedAt` and `timeToUpdate`.
    pub refresh_interval: TimeDelta,

    // =========================
    // Page bootstrap
    // =========================
    /// `oz` or `gr`. Not validated here: the page treats any other value as
    /// "update nothing but the date and countdown".
    pub price_unit_of_measure: String,

    /// Route the refresh endpoint is mounted on.
    pub ajax_path: String,

    /// Public origin used to build `ajax_url` for the page.
    pub public_base_url: String,

    // =========================
    // Formatting
    // =========================
    /// Used when the price source has no currency symbol configured.
    pub currency_symbol: String,

    /// Site-local offset applied to the `currentDate` display string.
    pub display_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind_addr = var("BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(|e| AppError::config("BIND_ADDR", format!("{e}")))?;

        let refresh_secs: i64 = var(
            "REFRESH_INTERVAL_SECS",
            &PriceComputer::DEFAULT_REFRESH_SECS.to_string(),
        )
        .parse()
        .map_err(|e| AppError::config("REFRESH_INTERVAL_SECS", format!("{e}")))?;
        let refresh_interval = TimeDelta::try_seconds(refresh_secs)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or_else(|| AppError::config("REFRESH_INTERVAL_SECS", "must be a positive number of seconds"))?;

        let offset_minutes: i32 = var("DISPLAY_UTC_OFFSET_MINUTES", "0")
            .parse()
            .map_err(|e| AppError::config("DISPLAY_UTC_OFFSET_MINUTES", format!("{e}")))?;
        let display_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| AppError::config("DISPLAY_UTC_OFFSET_MINUTES", "offset out of range"))?;

        let public_base_url = var("PUBLIC_BASE_URL", "http://localhost:8080");
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        let ajax_path = var("AJAX_PATH", "/wp-admin/admin-ajax.php");
        if !ajax_path.starts_with('/') {
            return Err(AppError::config("AJAX_PATH", "must start with `/`"));
        }

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL", "sqlite://metals_dev.db?mode=rwc"),
            cache_backend: CacheBackend::parse(&var("CACHE_BACKEND", "sql"))?,
            refresh_interval,
            price_unit_of_measure: var("PRICE_UNIT_OF_MEASURE", "oz"),
            ajax_path,
            public_base_url,
            currency_symbol: var("CURRENCY_SYMBOL", "$"),
            display_offset,
        })
    }

    pub fn ajax_url(&self) -> String {
        format!("{}{}", self.public_base_url, self.ajax_path)
    }

    pub fn price_computer(&self) -> PriceComputer {
        PriceComputer::new(self.refresh_interval).with_display_offset(self.display_offset)
    }
}
