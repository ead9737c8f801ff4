//! HTTP/1.1 server on hyper.
//!
//! Accepts connections until the [`ShutdownSignal`] fires, serving each on
//! its own task. Request bodies are read in full (bounded by the request
//! timeout) before the [`Handler`] sees them; a body that cannot be read is
//! flagged with [`BodyReadFailure`] instead of being answered here. On shutdown the listener is
//! closed, open connections finish their in-flight request, and the server
//! waits for them up to the shutdown timeout.
//!
//! ```rust,ignore
//! let server = Server::new(ServerConfig::default(), handler, logger);
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use greenhouse_core::codec::encode;
use greenhouse_core::{ErrorEnvelope, Handler, Logger, Request, RequestContext, Response};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("bind {addr}: {source}")]
    Bind {
        /// Address from the config.
        addr: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// Any other socket failure.
    #[error("server io: {0}")]
    Io(#[from] std::io::Error),
}

/// An HTTP server that has not bound yet.
pub struct Server {
    config: ServerConfig,
    handler: Handler,
    logger: Logger,
}

impl Server {
    /// Creates a server dispatching every request to `handler`.
    #[must_use]
    pub fn new(config: ServerConfig, handler: Handler, logger: Logger) -> Self {
        Self {
            config,
            handler,
            logger,
        }
    }

    /// The server's settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self.config.http_addr().to_string();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(BoundServer {
            listener,
            server: self,
        })
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.bind().await?.serve(shutdown).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A server holding a bound listener.
pub struct BoundServer {
    listener: TcpListener,
    server: Server,
}

impl BoundServer {
    /// The address actually bound. Useful with port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` fires, then drains.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        let Self { listener, server } = self;
        let logger = server.logger.clone();
        let shutdown_timeout = server.config.shutdown_timeout();
        let dispatcher = Arc::new(Dispatcher {
            handler: server.handler,
            request_timeout: server.config.request_timeout(),
            logger: server.logger,
        });
        let tracker = ConnectionTracker::new();

        logger.info(format_args!("listening on {addr}"));

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let token = tracker.acquire();
                        let dispatcher = Arc::clone(&dispatcher);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, peer, dispatcher, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(err) => logger.warn(format_args!("accept failed: {err}")),
                },
                () = shutdown.recv() => {
                    logger.info("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);
        drain(&tracker, shutdown_timeout, &logger).await;
        logger.info("server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for BoundServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundServer")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("server", &self.server)
            .finish()
    }
}

async fn drain(tracker: &ConnectionTracker, timeout: Duration, logger: &Logger) {
    let active = tracker.active_connections();
    if active == 0 {
        return;
    }

    logger.info(format_args!("waiting for {active} open connection(s)"));
    if tokio::time::timeout(timeout, tracker.wait_for_drain())
        .await
        .is_err()
    {
        logger.warn(format_args!(
            "shutdown timeout of {timeout:?} elapsed with {} connection(s) still open",
            tracker.active_connections()
        ));
    }
}

struct Dispatcher {
    handler: Handler,
    request_timeout: Duration,
    logger: Logger,
}

impl Dispatcher {
    async fn handle(&self, request: hyper::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();

        let (body, failure) = match tokio::time::timeout(self.request_timeout, body.collect()).await {
            Ok(Ok(collected)) => (collected.to_bytes(), None),
            Ok(Err(err)) => (
                Bytes::new(),
                Some(BodyReadFailure::new(
                    StatusCode::BAD_REQUEST,
                    format!("failed to read request body: {err}"),
                )),
            ),
            Err(_) => (
                Bytes::new(),
                Some(BodyReadFailure::new(
                    StatusCode::REQUEST_TIMEOUT,
                    "request body read timed out",
                )),
            ),
        };

        let mut request = Request::from_parts(parts, body);
        if let Some(failure) = failure {
            request.extensions_mut().insert(failure);
        }
        (self.handler)(RequestContext::new(), request).await
    }
}

/// Marks a request whose body could not be read.
///
/// The server still runs the handler chain for such a request, with an empty
/// body and this value in the request extensions, so middleware sees every
/// request. [`Router`](crate::Router) answers it without dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReadFailure {
    status: StatusCode,
    reason: String,
}

impl BodyReadFailure {
    /// Creates a failure answered with `status`.
    #[must_use]
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Status the request is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Why the body was rejected.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Logs the failure through `logger` and renders the error envelope.
    #[must_use]
    pub fn into_response(self, logger: &Logger) -> Response {
        logger.warn(&self.reason);
        encode(self.status, &ErrorEnvelope::new(self.reason), logger)
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
) {
    let logger = dispatcher.logger.clone();
    let io = TokioIo::new(stream);
    let service = service_fn(move |request| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Infallible>(dispatcher.handle(request).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    logger.debug(format_args!("connection from {peer} ended with error: {err}"));
                }
                break;
            }
            () = shutdown.recv(), if !closing => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_core::handler_fn;
    use http_body_util::Full;

    fn ok_handler() -> Handler {
        handler_fn(|_ctx, _req| async { Response::new(Full::new(Bytes::from_static(b"ok"))) })
    }

    fn local_config() -> ServerConfig {
        ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_secs(1))
            .build()
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let bound = Server::new(local_config(), ok_handler(), Logger::noop())
            .bind()
            .await
            .unwrap();

        let addr = bound.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let config = ServerConfig::builder().http_addr("not an address").build();
        let err = Server::new(config, ok_handler(), Logger::noop())
            .bind()
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().starts_with("bind not an address: "));
    }

    #[tokio::test]
    async fn test_shutdown_without_connections_is_prompt() {
        let shutdown = ShutdownSignal::new();
        let bound = Server::new(local_config(), ok_handler(), Logger::noop())
            .bind()
            .await
            .unwrap();
        let task = tokio::spawn(bound.serve(shutdown.clone()));

        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .expect("server should stop promptly")
            .unwrap();
        assert!(result.is_ok());
    }
}
