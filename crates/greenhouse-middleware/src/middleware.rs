//! Core middleware trait and chain link.
//!
//! # Example
//!
//! ```
//! use greenhouse_core::RequestContext;
//! use greenhouse_middleware::{BoxFuture, Middleware, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?start.elapsed(), "timing");
//!             response
//!         })
//!     }
//! }
//! ```

use greenhouse_core::{BoxFuture, Handler, Request, RequestContext, Response};

/// A stage in a [`Pipeline`](crate::Pipeline).
///
/// A stage receives the request's context by value. To hand new values to the
/// stages below it, it derives a context with
/// [`RequestContext::with`] and passes that to [`Next::run`]; its own copy is
/// unaffected.
///
/// # Invariants
///
/// - Call `next.run()` at most once; not calling it short-circuits the chain
/// - Return the downstream response rather than replacing error statuses
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, used in logs and [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Processes the request, usually by calling `next`.
    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The rest of the chain after the current stage.
///
/// Consumed by [`run`](Self::run), so it can be invoked only once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a Handler),
}

impl<'a> Next<'a> {
    /// Creates a link that runs `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal link that invokes `handler`.
    pub fn handler(handler: &'a Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::Handler(_) => f.debug_tuple("Next").field(&"handler").finish(),
        }
    }
}
