//! Countdown client for the metals price strip.
//!
//! [`Countdown`] is the pure timing logic; [`CountdownClient`] drives it
//! with a one-second tick and background refresh fetches.

pub mod client;
pub mod display;
pub mod error;
pub mod fetch;
pub mod state;

pub use client::CountdownClient;
pub use display::{DomUpdate, Field, MemoryDisplay, PriceDisplay};
pub use error::CountdownError;
pub use fetch::{HttpPriceFetcher, PriceFetcher, fetch_bootstrap};
pub use state::{Countdown, Effect, format_remaining};
