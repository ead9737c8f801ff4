//! Method + path routing under a root prefix.
//!
//! Patterns are literal segments and `{name}` parameters. One leading and
//! one trailing slash are ignored on both sides, so `/plants/{id}/` matches
//! `/plants/42` and `/plants/42/`. An empty segment still counts, which lets
//! `/plants//` reach the `{id}` route with an empty id.
//!
//! ```rust
//! use bytes::Bytes;
//! use greenhouse_core::{handler_fn, Logger, Response};
//! use greenhouse_server::Router;
//! use http::Method;
//! use http_body_util::Full;
//!
//! let noop = handler_fn(|_ctx, _req| async { Response::new(Full::new(Bytes::new())) });
//!
//! let mut router = Router::new("/api/v1", Logger::noop());
//! router.add_route(Method::GET, "/plants/{id}/", noop);
//!
//! assert_eq!(router.route_count(), 1);
//! assert_eq!(router.paths().route(&Method::GET, "/plants/"), "GET /api/v1/plants/");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use greenhouse_core::codec::encode;
use greenhouse_core::{handler_fn, ErrorEnvelope, Handler, Logger, Request, RequestContext, Response};
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};

use crate::server::BodyReadFailure;

/// Path parameters of the matched route, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Value of the `{name}` segment.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the route had no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for PathParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

/// Builds full route paths from a root prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    root: String,
}

impl RoutePath {
    /// Creates a generator for `root`. A trailing slash on `root` is dropped.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    /// The normalized root prefix.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// `path` under the root prefix.
    #[must_use]
    pub fn path(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    /// `"METHOD root+path"`, e.g. `"GET /api/v1/plants/"`.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> String {
        format!("{method} {}", self.path(path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler,
}

impl Route {
    fn new(method: Method, pattern: String, handler: Handler) -> Self {
        let segments = split_path(&pattern)
            .into_iter()
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            method,
            pattern,
            segments,
            handler,
        }
    }

    fn match_path(&self, path: &[&str]) -> Option<PathParams> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, actual) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(expected) if expected == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(PathParams(params))
    }
}

enum Match<'a> {
    Found(&'a Handler, PathParams),
    MethodNotAllowed(Vec<&'a Method>),
    NotFound,
}

/// Dispatches requests to handlers by method and path.
///
/// Routes are checked in registration order; the first match wins. A request
/// flagged with [`BodyReadFailure`] is answered with that failure and never
/// reaches a route.
pub struct Router {
    paths: RoutePath,
    routes: Vec<Route>,
    fallback: Logger,
}

impl Router {
    /// Creates a router mounting every route under `root_prefix`.
    ///
    /// `fallback` logs unmatched requests when the context has no scoped
    /// logger.
    #[must_use]
    pub fn new(root_prefix: impl Into<String>, fallback: Logger) -> Self {
        Self {
            paths: RoutePath::new(root_prefix),
            routes: Vec::new(),
            fallback,
        }
    }

    /// Registers `handler` for `method` on `pattern` (relative to the root).
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: Handler) {
        let full = self.paths.path(pattern);
        self.routes.push(Route::new(method, full, handler));
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// The path generator for this router's root prefix.
    #[must_use]
    pub fn paths(&self) -> &RoutePath {
        &self.paths
    }

    /// `"METHOD /full/pattern"` for every route, in registration order.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|route| format!("{} {}", route.method, route.pattern))
            .collect()
    }

    fn match_route(&self, method: &Method, path: &str) -> Match<'_> {
        let segments = split_path(path);
        let mut allowed = Vec::new();

        for route in &self.routes {
            if let Some(params) = route.match_path(&segments) {
                if route.method == *method {
                    return Match::Found(&route.handler, params);
                }
                allowed.push(&route.method);
            }
        }

        if allowed.is_empty() {
            Match::NotFound
        } else {
            Match::MethodNotAllowed(allowed)
        }
    }

    async fn dispatch(&self, ctx: RequestContext, mut request: Request) -> Response {
        if let Some(failure) = request.extensions_mut().remove::<BodyReadFailure>() {
            return failure.into_response(&ctx.logger_or(&self.fallback));
        }

        let path = request.uri().path().to_string();

        match self.match_route(request.method(), &path) {
            Match::Found(handler, params) => {
                let handler = Arc::clone(handler);
                request.extensions_mut().insert(params);
                handler(ctx, request).await
            }
            Match::MethodNotAllowed(allowed) => {
                let logger = ctx.logger_or(&self.fallback);
                logger.debug(format_args!("method {} not allowed for {path}", request.method()));

                let allow = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = encode(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &ErrorEnvelope::new(format!("method {} not allowed", request.method())),
                    &logger,
                );
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            Match::NotFound => {
                let logger = ctx.logger_or(&self.fallback);
                logger.debug(format_args!("no route for {path}"));
                encode(
                    StatusCode::NOT_FOUND,
                    &ErrorEnvelope::new(format!("no route for {path}")),
                    &logger,
                )
            }
        }
    }

    /// Turns the router into a [`Handler`].
    #[must_use]
    pub fn into_handler(self) -> Handler {
        let router = Arc::new(self);
        handler_fn(move |ctx, request| {
            let router = Arc::clone(&router);
            async move { router.dispatch(ctx, request).await }
        })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.paths.root())
            .field("routes", &self.describe())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};

    fn echo_param(name: &'static str) -> Handler {
        handler_fn(move |_ctx, request: Request| async move {
            let value = request
                .extensions()
                .get::<PathParams>()
                .and_then(|params| params.get(name))
                .unwrap_or("<none>")
                .to_string();
            Response::new(Full::new(Bytes::from(value)))
        })
    }

    fn fixed(body: &'static str) -> Handler {
        handler_fn(move |_ctx, _req| async move { Response::new(Full::new(Bytes::from(body))) })
    }

    fn router() -> Router {
        let mut router = Router::new("/api/v1", Logger::noop());
        router.add_route(Method::GET, "/plants/", fixed("list"));
        router.add_route(Method::POST, "/plants/", fixed("create"));
        router.add_route(Method::GET, "/plants/{id}/", echo_param("id"));
        router
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    async fn call(handler: &Handler, method: Method, uri: &str) -> (StatusCode, String) {
        let response = handler(RequestContext::new(), request(method, uri)).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_route_path() {
        let paths = RoutePath::new("/api/v1");
        assert_eq!(paths.route(&Method::GET, "/plants/"), "GET /api/v1/plants/");
        assert_eq!(paths.route(&Method::POST, "/plants/"), "POST /api/v1/plants/");
        assert_eq!(RoutePath::new("/api/v1/").path("/health"), "/api/v1/health");
        assert_eq!(RoutePath::new("").path("/health"), "/health");
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            router().describe(),
            vec![
                "GET /api/v1/plants/",
                "POST /api/v1/plants/",
                "GET /api/v1/plants/{id}/",
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_by_method() {
        let handler = router().into_handler();
        assert_eq!(call(&handler, Method::GET, "/api/v1/plants/").await.1, "list");
        assert_eq!(call(&handler, Method::POST, "/api/v1/plants/").await.1, "create");
    }

    #[tokio::test]
    async fn test_param_extraction_and_trailing_slash() {
        let handler = router().into_handler();
        assert_eq!(call(&handler, Method::GET, "/api/v1/plants/42/").await.1, "42");
        assert_eq!(call(&handler, Method::GET, "/api/v1/plants/42").await.1, "42");
        assert_eq!(call(&handler, Method::GET, "/api/v1/plants").await.1, "list");
    }

    #[tokio::test]
    async fn test_empty_param_reaches_handler() {
        let handler = router().into_handler();
        let (status, body) = call(&handler, Method::GET, "/api/v1/plants//").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let handler = router().into_handler();
        let (status, body) = call(&handler, Method::GET, "/api/v2/plants/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"message":"no route for /api/v2/plants/"}"#);
    }

    #[tokio::test]
    async fn test_body_read_failure_skips_routes() {
        let handler = router().into_handler();
        let mut request = request(Method::POST, "/api/v1/plants/");
        request.extensions_mut().insert(BodyReadFailure::new(
            StatusCode::REQUEST_TIMEOUT,
            "request body read timed out",
        ));

        let response = handler(RequestContext::new(), request).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"message":"request body read timed out"}"#);
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let handler = router().into_handler();
        let response = handler(RequestContext::new(), request(Method::DELETE, "/api/v1/plants/")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, POST");
    }
}
