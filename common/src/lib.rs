//! Logging bootstrap shared by the price server and the countdown client.

pub mod logger;

pub use logger::{TraceId, init_logger, init_tracing, request_span, warn_if_slow};
