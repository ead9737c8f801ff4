//! Request tracing middleware.
//!
//! Gives every request a [`TraceId`] and a logger scoped to it:
//!
//! 1. Mint a UUID v7 trace id (or reuse a trusted `x-request-id`)
//! 2. Derive a child of the service logger carrying `trace_id`
//! 3. Bind both into the context passed downstream
//! 4. Echo the id in the `x-request-id` response header
//!
//! The downstream future is instrumented with the logger's span, so plain
//! `tracing` events emitted by handlers are grouped under the request. The id
//! itself is a field on every event written through the scoped [`Logger`].

use crate::middleware::{Middleware, Next};
use greenhouse_core::{BoxFuture, Logger, Request, RequestContext, Response, TraceId};
use http::HeaderValue;
use tracing::Instrument;

/// The header name for trace id propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that mints trace ids and scoped loggers.
///
/// # Example
///
/// ```
/// use greenhouse_core::Logger;
/// use greenhouse_middleware::TracingMiddleware;
///
/// let tracing = TracingMiddleware::new(Logger::new());
/// let internal = TracingMiddleware::new(Logger::new()).trust_incoming(true);
/// ```
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    logger: Logger,

    /// Reuse a valid incoming `x-request-id`. Off by default; enable it only
    /// behind a proxy that sets the header.
    trust_incoming: bool,
}

impl TracingMiddleware {
    /// Creates the middleware. Request loggers are children of `logger`.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            trust_incoming: false,
        }
    }

    /// Sets whether an incoming `x-request-id` is reused.
    #[must_use]
    pub fn trust_incoming(mut self, trust: bool) -> Self {
        self.trust_incoming = trust;
        self
    }

    fn extract_trace_id(&self, request: &Request) -> Option<TraceId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(TraceId::parse)
    }
}

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let trace_id = self
                .extract_trace_id(&request)
                .unwrap_or_else(TraceId::new);
            let logger = self.logger.with_trace_id(trace_id);
            let span = logger.span().cloned();
            let ctx = ctx.with_trace_id(trace_id).with_logger(logger);

            let mut response = match span {
                Some(span) => next.run(ctx, request).instrument(span).await,
                None => next.run(ctx, request).await,
            };

            if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            response
        })
    }
}
