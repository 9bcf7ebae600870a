//! Domain core for the metals price display.
//!
//! Shared by the server (which computes and caches snapshots) and the
//! countdown client (which consumes the wire payload).

pub mod compute;
pub mod error;
pub mod snapshot;
pub mod time;
pub mod types;
pub mod wire;

pub use compute::{GRAMS_PER_TROY_OUNCE, MetalQuote, PriceComputer, format_price, quote, round2};
pub use error::MetalsError;
pub use snapshot::{MetalPrices, PriceSnapshot};
pub use types::{Metal, RawPriceReading, Trend, UnitOfMeasure};
pub use wire::{BootstrapData, PricePayload};

/// Store key under which the active snapshot is cached.
pub const CACHE_KEY: &str = "metal_price_json";

/// Ajax action served by the refresh endpoint.
pub const REFRESH_ACTION: &str = "get_metal_prices";
