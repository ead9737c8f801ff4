//! # Greenhouse Server
//!
//! The HTTP surface of the plant service:
//!
//! - [`Router`] - Method + path template matching under a root prefix
//! - [`handlers`] - Health and plant resource handlers
//! - [`Api`] - Routes, handlers and middleware assembled into one [`Handler`]
//! - [`Server`] - hyper HTTP/1.1 accept loop with graceful shutdown
//! - [`TestClient`] - Drives a [`Handler`] in memory, without a socket
//!
//! ## Example
//!
//! ```rust,ignore
//! use greenhouse_core::Logger;
//! use greenhouse_server::{Api, Server, ServerConfig};
//! use greenhouse_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let logger = Logger::new();
//! let store = Arc::new(MemoryStore::new(logger.clone()));
//! let handler = Api::new(logger, "/api/v1", store).into_handler();
//!
//! let server = Server::new(ServerConfig::default(), handler, Logger::new());
//! server.run().await?;
//! ```
//!
//! [`Handler`]: greenhouse_core::Handler

#![doc(html_root_url = "https://docs.rs/greenhouse-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod config;
pub mod handlers;
mod router;
mod server;
mod shutdown;
mod test_client;

pub use api::{Api, ADMIN_CREDENTIAL};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use router::{PathParams, RoutePath, Router};
pub use server::{BodyReadFailure, BoundServer, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use test_client::{TestClient, TestRequestBuilder, TestResponse};
