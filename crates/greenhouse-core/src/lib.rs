//! # Greenhouse Core
//!
//! Core types shared by every Greenhouse crate.
//!
//! - [`RequestContext`] - Immutable per-request value carrier with typed keys
//! - [`TraceId`] - UUID v7 identifier minted once per request
//! - [`Logger`] - Structured logger handle passed explicitly, scoped per request
//! - [`ApiError`] - Error taxonomy and its single HTTP status policy
//! - [`codec`] - JSON decode, validate and encode helpers
//! - [`Handler`] - Type-erased async request handler

#![doc(html_root_url = "https://docs.rs/greenhouse-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codec;
mod context;
mod error;
mod handler;
mod logger;

pub use codec::{decode, decode_valid, encode, DecodeError, Validate};
pub use context::{ContextKey, LoggerKey, RequestContext, TraceId, TraceIdKey};
pub use error::{ApiError, ErrorEnvelope, Problems};
pub use handler::{handler_fn, BoxFuture, Handler, Request, Response};
pub use logger::Logger;
