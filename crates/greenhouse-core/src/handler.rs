//! Request, response and handler types.

use crate::context::RequestContext;
use bytes::Bytes;
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Inbound request with its body already collected.
pub type Request = http::Request<Bytes>;

/// Outbound response.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased async handler.
///
/// Routers, middleware pipelines and resource handlers all share this shape,
/// which is what lets a pipeline wrap a single route or the whole router.
pub type Handler = Arc<dyn Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps an async function as a [`Handler`].
///
/// # Example
///
/// ```
/// use greenhouse_core::{handler_fn, Response};
///
/// let handler = handler_fn(|_ctx, _req| async { Response::new("ok".into()) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx, request| Box::pin(f(ctx, request)))
}
