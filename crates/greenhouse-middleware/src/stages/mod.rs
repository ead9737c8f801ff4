//! Built-in middleware stages.
//!
//! The service's global chain is [`tracing`] then [`request_log`], in that
//! order, so request log records carry the trace id. [`access_gate`] wraps
//! individual routes.

pub mod access_gate;
pub mod request_log;
pub mod tracing;

pub use access_gate::AdminOnly;
pub use request_log::RequestLogMiddleware;
pub use tracing::TracingMiddleware;
