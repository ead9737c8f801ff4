//! Serves the plant API over a real socket.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use greenhouse_core::Logger;
use greenhouse_server::{Api, Server, ServerConfig, ShutdownSignal};
use greenhouse_store::MemoryStore;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use greenhouse_telemetry::capture::capture_logs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn send(
    addr: std::net::SocketAddr,
    method: Method,
    path: &str,
    body: &'static str,
) -> (StatusCode, http::HeaderMap, String) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(conn);

    let request = http::Request::builder()
        .method(method)
        .uri(path)
        .header(http::header::HOST, addr.to_string())
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap();
    let response = sender.send_request(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_serves_api_over_tcp() {
    let logger = Logger::noop();
    let store = Arc::new(MemoryStore::new(logger.clone()));
    let handler = Api::new(logger.clone(), "/api/v1", store).into_handler();
    let config = ServerConfig::builder()
        .http_addr("127.0.0.1:0")
        .shutdown_timeout(Duration::from_secs(2))
        .build();

    let bound = Server::new(config, handler, logger).bind().await.unwrap();
    let addr = bound.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(bound.serve(shutdown.clone()));

    let (status, headers, body) = send(addr, Method::GET, "/api/v1/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#""""#);
    assert!(headers.contains_key("x-request-id"));

    let (status, _, body) = send(
        addr,
        Method::POST,
        "/api/v1/plants/",
        r#"{"name":"fern","height":3}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["name"], "fern");

    let (status, _, body) = send(addr, Method::GET, "/api/v1/plants/", "").await;
    assert_eq!(status, StatusCode::OK);
    let listed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_stops_accepting_after_shutdown() {
    let logger = Logger::noop();
    let handler = Api::new(logger.clone(), "/api/v1", Arc::new(MemoryStore::new(logger.clone())))
        .into_handler();
    let config = ServerConfig::builder().http_addr("127.0.0.1:0").build();

    let bound = Server::new(config, handler, logger).bind().await.unwrap();
    let addr = bound.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();

    bound.serve(shutdown).await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

async fn read_head(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut chunk = [0u8; 1024];
    while !received.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&received).into_owned()
}

#[tokio::test]
async fn test_stalled_body_goes_through_middleware() {
    let (logs, _guard) = capture_logs();
    let logger = Logger::new();
    let handler = Api::new(logger.clone(), "/api/v1", Arc::new(MemoryStore::new(logger.clone())))
        .into_handler();
    let config = ServerConfig::builder()
        .http_addr("127.0.0.1:0")
        .request_timeout(Duration::from_millis(200))
        .shutdown_timeout(Duration::from_secs(1))
        .build();

    let bound = Server::new(config, handler, logger).bind().await.unwrap();
    let addr = bound.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(bound.serve(shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"POST /api/v1/plants/ HTTP/1.1\r\nHost: localhost\r\n\
              Transfer-Encoding: chunked\r\n\r\n10\r\n{\"name\"",
        )
        .await
        .unwrap();

    let head = tokio::time::timeout(Duration::from_secs(3), read_head(&mut stream))
        .await
        .expect("response before timeout");
    let head = head.to_ascii_lowercase();
    assert!(head.starts_with("http/1.1 408"), "unexpected response: {head}");
    assert!(head.contains("x-request-id: "));

    let records = logs.lines_containing("request_log");
    assert_eq!(records.len(), 1);
    assert!(records[0].contains("status=408"));
    assert!(records[0].contains("trace_id="));
    assert_eq!(logs.lines_containing("request body read timed out").len(), 1);

    drop(stream);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}
