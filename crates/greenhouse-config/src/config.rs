//! Configuration types and validation.

use crate::ConfigError;
use greenhouse_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default listen host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default path prefix for every route.
pub const DEFAULT_ROOT_PREFIX: &str = "/api/v1";

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GreenhouseConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl GreenhouseConfig {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name or IP to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Path prefix under which every route is mounted.
    pub root_prefix: String,

    /// Time to wait for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Time allowed for reading a request body.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root_prefix: DEFAULT_ROOT_PREFIX.to_string(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    /// `host:port`, with IPv6 hosts bracketed.
    #[must_use]
    pub fn http_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("server.host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid_value("server.port", "must not be 0"));
        }
        if !self.root_prefix.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "server.root_prefix",
                format!("must start with '/': {}", self.root_prefix),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `greenhouse_store=debug,info`.
    pub level: String,

    /// Output layout.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Converts to the subscriber settings.
    ///
    /// Pretty output also shows file and line of each event.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            ..base
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        greenhouse_telemetry::logging::create_env_filter(&self.level)
            .map(|_| ())
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))
    }
}

/// A setting that fell back to its default because its variable was unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    /// Field name, e.g. `host`.
    pub field: &'static str,
    /// Value used instead.
    pub value: String,
}

impl Fallback {
    /// Creates a fallback record.
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "using fallback {} value: {}", self.field, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GreenhouseConfig::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.root_prefix, "/api/v1");
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_addr() {
        let mut server = ServerConfig::default();
        assert_eq!(server.http_addr(), "localhost:8080");

        server.host = "::1".to_string();
        assert_eq!(server.http_addr(), "[::1]:8080");
    }

    #[test]
    fn test_rejects_port_zero() {
        let mut config = GreenhouseConfig::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_rejects_relative_prefix() {
        let mut config = GreenhouseConfig::default();
        config.server.root_prefix = "api/v1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_level() {
        let mut config = GreenhouseConfig::default();
        config.logging.level = "greenhouse=loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_to_log_config() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
        };
        let log_config = logging.to_log_config();
        assert_eq!(log_config.level, "debug");
        assert_eq!(log_config.format, LogFormat::Json);
        assert!(!log_config.ansi);
        assert!(!log_config.file_line_info);
    }

    #[test]
    fn test_to_log_config_pretty_keeps_level() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        };
        let log_config = logging.to_log_config();
        assert_eq!(log_config.level, "warn");
        assert!(log_config.file_line_info);
        assert!(log_config.ansi);
    }

    #[test]
    fn test_fallback_display() {
        let fallback = Fallback::new("port", "8080");
        assert_eq!(fallback.to_string(), "using fallback port value: 8080");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<GreenhouseConfig, _> = toml::from_str("[server]\nhots = \"x\"\n");
        assert!(result.is_err());
    }
}
