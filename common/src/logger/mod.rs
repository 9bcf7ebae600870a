mod init;
mod span;
mod trace_id;

pub use init::{init_logger, init_tracing};
pub use span::{request_span, warn_if_slow};
pub use trace_id::TraceId;
