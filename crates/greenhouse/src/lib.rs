//! # Greenhouse
//!
//! A small JSON API over an in-memory plant store, with request tracing,
//! request logging and a placeholder admin gate around the handlers.
//!
//! This crate wires the workspace together and re-exports its parts:
//!
//! - [`core`] - Request context, scoped logger, errors, JSON codec
//! - [`middleware`] - Middleware pipeline and stages
//! - [`store`] - Plant model and storage
//! - [`config`] - Layered configuration
//! - [`telemetry`] - Subscriber setup
//! - [`server`] - Router, handlers, HTTP server
//!
//! ## Example
//!
//! ```rust,ignore
//! use greenhouse::{build_handler, server_config};
//! use greenhouse::config::ConfigLoader;
//! use greenhouse::core::Logger;
//! use greenhouse::server::Server;
//!
//! let config = ConfigLoader::new().load()?;
//! let logger = Logger::new();
//! let handler = build_handler(&config, logger.clone());
//! Server::new(server_config(&config), handler, logger).run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/greenhouse/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use greenhouse_config as config;
pub use greenhouse_core as core;
pub use greenhouse_middleware as middleware;
pub use greenhouse_server as server;
pub use greenhouse_store as store;
pub use greenhouse_telemetry as telemetry;

use std::sync::Arc;

use greenhouse_config::GreenhouseConfig;
use greenhouse_core::{Handler, Logger};
use greenhouse_server::{Api, ServerConfig};
use greenhouse_store::MemoryStore;

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the API handler over a fresh in-memory store.
#[must_use]
pub fn build_handler(config: &GreenhouseConfig, logger: Logger) -> Handler {
    let store = Arc::new(MemoryStore::new(logger.clone()));
    Api::new(logger, config.server.root_prefix.clone(), store).into_handler()
}

/// Maps the loaded configuration onto server settings.
#[must_use]
pub fn server_config(config: &GreenhouseConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr())
        .shutdown_timeout(config.server.shutdown_timeout())
        .request_timeout(config.server.request_timeout())
        .build()
}
