//! # Greenhouse Middleware
//!
//! Composable middleware for the Greenhouse plant service.
//!
//! A [`Pipeline`] is an ordered list of [`Middleware`] stages. The first stage
//! added runs outermost: it sees the request first and the response last.
//!
//! ```text
//! Request → Tracing → RequestLog → [AdminOnly] → Handler
//!                                                   ↓
//! Response ← Tracing ← RequestLog ← [AdminOnly] ←──┘
//! ```
//!
//! | Stage | Middleware | Purpose |
//! |-------|------------|---------|
//! | `tracing` | [`TracingMiddleware`] | Mint a trace id, scope the logger, echo `x-request-id` |
//! | `request_log` | [`RequestLogMiddleware`] | One log record per request with status and duration |
//! | `admin_only` | [`AdminOnly`] | Access-gate placeholder, always passes |
//!
//! Pipelines turn into plain [`Handler`]s with [`Pipeline::into_handler`], so
//! one can wrap the whole router and another a single route.
//!
//! [`Handler`]: greenhouse_core::Handler

#![doc(html_root_url = "https://docs.rs/greenhouse-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use greenhouse_core::{BoxFuture, Request, Response};
pub use middleware::{Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::access_gate::AdminOnly;
pub use stages::request_log::{RequestLogMiddleware, RequestRecord};
pub use stages::tracing::{TracingMiddleware, REQUEST_ID_HEADER};
