//! In-memory client for exercising a [`Handler`] without a socket.
//!
//! ```rust,ignore
//! let client = TestClient::new(api.into_handler());
//!
//! let response = client.post("/api/v1/plants/").json(&plant).send().await;
//! response.assert_status(StatusCode::OK);
//! let created: Plant = response.json();
//! ```

use bytes::Bytes;
use greenhouse_core::codec::JSON_CONTENT_TYPE;
use greenhouse_core::{Handler, RequestContext};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Sends requests straight to a [`Handler`].
#[derive(Clone)]
pub struct TestClient {
    handler: Handler,
}

impl TestClient {
    /// Creates a client for `handler`.
    #[must_use]
    pub fn new(handler: Handler) -> Self {
        Self { handler }
    }

    /// Starts a GET request.
    #[must_use]
    pub fn get(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    #[must_use]
    pub fn post(&self, uri: &str) -> TestRequestBuilder<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a request with any method.
    #[must_use]
    pub fn request(&self, method: Method, uri: &str) -> TestRequestBuilder<'_> {
        TestRequestBuilder {
            client: self,
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient").finish_non_exhaustive()
    }
}

/// A request under construction.
#[derive(Debug)]
#[must_use]
pub struct TestRequestBuilder<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

impl TestRequestBuilder<'_> {
    /// Adds a header.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes()).expect("valid header name");
        let value = HeaderValue::from_str(value).expect("valid header value");
        self.headers.insert(name, value);
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = Bytes::from(serde_json::to_vec(value).expect("serializable body"));
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self
    }

    /// Sends the request with a fresh context.
    ///
    /// # Panics
    ///
    /// Panics if the URI is invalid.
    pub async fn send(self) -> TestResponse {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(self.body)
            .expect("valid request");
        *request.headers_mut() = self.headers;

        let response = (self.client.handler)(RequestContext::new(), request).await;
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("utf-8 body")
    }

    /// Body decoded as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body does not decode as `T`.
    #[must_use]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not valid JSON ({e}): {}", self.text()))
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics on mismatch, printing the body.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_core::{handler_fn, Request, Response};
    use http_body_util::Full;

    fn echo() -> Handler {
        handler_fn(|_ctx, request: Request| async move {
            let mut response = Response::new(Full::new(request.body().clone()));
            if let Some(value) = request.headers().get(CONTENT_TYPE) {
                response.headers_mut().insert(CONTENT_TYPE, value.clone());
            }
            *response.status_mut() = StatusCode::CREATED;
            response
        })
    }

    #[test]
    fn test_json_round_trip() {
        let client = TestClient::new(echo());
        let response = tokio_test::block_on(
            client
                .post("/echo")
                .json(&serde_json::json!({"name": "fern"}))
                .send(),
        );

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.header("content-type"), Some(JSON_CONTENT_TYPE));
        let value: serde_json::Value = response.json();
        assert_eq!(value["name"], "fern");
    }

    #[test]
    fn test_raw_body_and_header() {
        let client = TestClient::new(echo());
        let response = tokio_test::block_on(
            client
                .request(Method::PUT, "/echo")
                .header("content-type", "text/plain")
                .body("hello")
                .send(),
        );

        assert_eq!(response.text(), "hello");
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }
}
