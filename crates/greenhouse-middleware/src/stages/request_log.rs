//! Request logging middleware.
//!
//! Emits exactly one `info` record per request, after the rest of the chain
//! has produced a response:
//!
//! ```text
//! INFO greenhouse:request: GET /api/v1/plants/?limit=2 trace_id=0190... method=GET path=/api/v1/plants/?limit=2 status=200 duration=1.2ms
//! ```
//!
//! The record goes through the request's scoped logger, so it carries the
//! trace id when [`TracingMiddleware`](super::TracingMiddleware) runs further
//! out.

use crate::middleware::{Middleware, Next};
use greenhouse_core::{BoxFuture, Logger, Request, RequestContext, Response};
use http::{Method, StatusCode};
use std::time::{Duration, Instant};

/// What gets logged about a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Request method.
    pub method: Method,
    /// Path including the query string.
    pub path: String,
    /// Status of the response the inner chain produced.
    pub status: StatusCode,
    /// Time spent in the inner chain.
    pub duration: Duration,
}

impl RequestRecord {
    /// Writes the record as one `info` event through `logger`.
    pub fn log(&self, logger: &Logger) {
        logger.in_scope(|| {
            tracing::info!(
                trace_id = logger.trace_field(),
                method = %self.method,
                path = %self.path,
                status = self.status.as_u16(),
                duration = ?self.duration,
                "{} {}",
                self.method,
                self.path
            );
        });
    }
}

/// Middleware that logs method, path, status and duration of each request.
#[derive(Debug, Clone)]
pub struct RequestLogMiddleware {
    fallback: Logger,
}

impl RequestLogMiddleware {
    /// Creates the middleware.
    ///
    /// `fallback` is used when no scoped logger is in the context.
    #[must_use]
    pub fn new(fallback: Logger) -> Self {
        Self { fallback }
    }
}

fn path_and_query(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string)
}

impl Middleware for RequestLogMiddleware {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().clone();
            let path = path_and_query(&request);

            let response = next.run(ctx.clone(), request).await;

            let record = RequestRecord {
                method,
                path,
                status: response.status(),
                duration: start.elapsed(),
            };
            record.log(&ctx.logger_or(&self.fallback));

            response
        })
    }
}
