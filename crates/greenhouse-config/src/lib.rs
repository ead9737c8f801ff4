//! Typed configuration for Greenhouse.
//!
//! Configuration is layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. An optional TOML or JSON file
//! 3. A `.env` file, loaded into the process environment
//! 4. Environment variables
//!
//! # Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `API_HOST` | `server.host` | `localhost` |
//! | `API_PORT` | `server.port` | `8080` |
//! | `API_ROOT_PREFIX` | `server.root_prefix` | `/api/v1` |
//!
//! Every field can also be set as `GREENHOUSE__SECTION__KEY`, for example
//! `GREENHOUSE__LOGGING__FORMAT=json`. The `API_*` names win when both are set.
//!
//! When `API_HOST` or `API_PORT` is missing the loader records a
//! [`Fallback`] naming the value used, so the caller can warn once logging is
//! up.
//!
//! # Example
//!
//! ```
//! use greenhouse_config::ConfigLoader;
//!
//! # fn main() -> Result<(), greenhouse_config::ConfigError> {
//! let (config, fallbacks) = ConfigLoader::new()
//!     .with_env(|key| (key == "API_PORT").then(|| "9000".to_string()))
//!     .load_with_fallbacks()?;
//!
//! assert_eq!(config.server.port, 9000);
//! assert_eq!(fallbacks[0].to_string(), "using fallback host value: localhost");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! root_prefix = "/api/v1"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/greenhouse-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    Fallback, GreenhouseConfig, LoggingConfig, ServerConfig, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_ROOT_PREFIX, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ConfigError;
pub use greenhouse_telemetry::LogFormat;
pub use loader::{ConfigLoader, ENV_API_HOST, ENV_API_PORT, ENV_API_ROOT_PREFIX, ENV_PREFIX};
