//! Ordered middleware pipeline.
//!
//! Stages are composed from the last one inward, so for stages `A, B, C` and
//! handler `h` the request runs `A(B(C(h)))`: entry order A, B, C and exit
//! order C, B, A.

use crate::middleware::{Middleware, Next};
use greenhouse_core::{Handler, Request, RequestContext, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware stages.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use greenhouse_core::{handler_fn, Logger, Response};
/// use greenhouse_middleware::{Pipeline, RequestLogMiddleware, TracingMiddleware};
///
/// let logger = Logger::new();
/// let pipeline = Pipeline::builder()
///     .stage(TracingMiddleware::new(logger.clone()))
///     .stage(RequestLogMiddleware::new(logger))
///     .build();
///
/// assert_eq!(pipeline.stage_names(), vec!["tracing", "request_log"]);
///
/// let app = Arc::new(pipeline).into_handler(handler_fn(|_ctx, _req| async {
///     Response::new("ok".into())
/// }));
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage and then `handler`.
    pub async fn process(&self, ctx: RequestContext, request: Request, handler: &Handler) -> Response {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    /// Wraps `inner` so that every call goes through this pipeline first.
    ///
    /// The result is itself a [`Handler`], so pipelines nest.
    pub fn into_handler(self: Arc<Self>, inner: Handler) -> Handler {
        Arc::new(move |ctx, request| {
            let pipeline = Arc::clone(&self);
            let inner = Arc::clone(&inner);
            Box::pin(async move { pipeline.process(ctx, request, &inner).await })
        })
    }

    fn build_chain<'a>(&'a self, handler: &'a Handler) -> Next<'a> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Stage names in request order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage. Stages added earlier run further out.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
