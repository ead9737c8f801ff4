//! Logging setup for Greenhouse.
//!
//! All emission goes through `tracing`. This crate installs the subscriber
//! that turns those events into output, either JSON lines for machines or a
//! pretty multi-line layout for people.
//!
//! # Example
//!
//! ```rust,ignore
//! use greenhouse_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("service starting");
//! ```
//!
//! With the `test-util` feature, [`capture`] provides an in-memory subscriber
//! for asserting on log output.

#![doc(html_root_url = "https://docs.rs/greenhouse-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(feature = "test-util")]
pub mod capture;
mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogConfig, LogFormat};
