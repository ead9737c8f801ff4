//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, `.env` and environment variables.

use std::fs;
use std::path::Path;

use crate::config::{Fallback, DEFAULT_HOST, DEFAULT_PORT};
use crate::{ConfigError, GreenhouseConfig};

/// Variable holding the listen host.
pub const ENV_API_HOST: &str = "API_HOST";

/// Variable holding the listen port.
pub const ENV_API_PORT: &str = "API_PORT";

/// Variable holding the route prefix.
pub const ENV_API_ROOT_PREFIX: &str = "API_ROOT_PREFIX";

/// Default prefix for `PREFIX__SECTION__KEY` overrides.
pub const ENV_PREFIX: &str = "GREENHOUSE";

/// Every `SECTION__KEY` pair the loader understands.
const ENV_KEYS: &[(&str, &str)] = &[
    ("SERVER", "HOST"),
    ("SERVER", "PORT"),
    ("SERVER", "ROOT_PREFIX"),
    ("SERVER", "SHUTDOWN_TIMEOUT_SECS"),
    ("SERVER", "REQUEST_TIMEOUT_MS"),
    ("LOGGING", "LEVEL"),
    ("LOGGING", "FORMAT"),
];

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration loader with layered approach.
///
/// The environment is read through a lookup function, by default the process
/// environment. Tests pass their own with [`with_env`](Self::with_env).
///
/// # Example
///
/// ```no_run
/// use greenhouse_config::ConfigLoader;
///
/// # fn main() -> Result<(), greenhouse_config::ConfigError> {
/// let (config, fallbacks) = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("greenhouse.toml")?
///     .with_dotenv()?
///     .load_with_fallbacks()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    config: GreenhouseConfig,
    env: EnvLookup,
    env_prefix: String,
    fallbacks: Vec<Fallback>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("config", &self.config)
            .field("env_prefix", &self.env_prefix)
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Create a loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GreenhouseConfig::default(),
            env: Box::new(|key: &str| std::env::var(key).ok()),
            env_prefix: ENV_PREFIX.to_string(),
            fallbacks: Vec::new(),
        }
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = GreenhouseConfig::default();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json), chosen by extension. Fields the
    /// file leaves out keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed or
    /// contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use greenhouse_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_env(|_| None)
    ///     .with_string("[server]\nport = 3000\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 3000);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Load `.env` from the current directory into the process environment.
    ///
    /// A missing file is not an error. Variables already set are not
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DotenvError` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::DotenvError(e.to_string())),
        }
    }

    /// Load a specific dotenv file into the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DotenvError` if the file cannot be loaded.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref()).map_err(|e| ConfigError::DotenvError(e.to_string()))?;
        Ok(self)
    }

    /// Read the environment through `getenv` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env<F>(mut self, getenv: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(getenv);
        self
    }

    /// Set the prefix for `PREFIX__SECTION__KEY` overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_uppercase();
        self
    }

    /// Apply the environment, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or validation
    /// fails.
    pub fn load(self) -> Result<GreenhouseConfig, ConfigError> {
        self.load_with_fallbacks().map(|(config, _)| config)
    }

    /// Like [`load`](Self::load), also returning the settings that fell back
    /// because `API_HOST` or `API_PORT` was unset.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_fallbacks(mut self) -> Result<(GreenhouseConfig, Vec<Fallback>), ConfigError> {
        self.apply_env_overrides()?;
        self.config.validate()?;
        Ok((self.config, self.fallbacks))
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<GreenhouseConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.is_empty())
    }

    // Prefixed overrides first, then the API_* names on top
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (section, field) in ENV_KEYS {
            let key = format!("{}__{section}__{field}", self.env_prefix);
            if let Some(value) = self.lookup(&key) {
                self.apply_env_var(&key, section, field, &value)?;
            }
        }

        // A fallback is only reported while the built-in default is in effect
        match self.lookup(ENV_API_HOST) {
            Some(host) => self.config.server.host = host,
            None if self.config.server.host == DEFAULT_HOST => {
                self.fallbacks.push(Fallback::new("host", DEFAULT_HOST));
            }
            None => {}
        }

        match self.lookup(ENV_API_PORT) {
            Some(port) => self.config.server.port = parse_port(ENV_API_PORT, &port)?,
            None if self.config.server.port == DEFAULT_PORT => {
                self.fallbacks
                    .push(Fallback::new("port", DEFAULT_PORT.to_string()));
            }
            None => {}
        }

        if let Some(prefix) = self.lookup(ENV_API_ROOT_PREFIX) {
            self.config.server.root_prefix = prefix;
        }

        Ok(())
    }

    fn apply_env_var(
        &mut self,
        key: &str,
        section: &str,
        field: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        match (section, field) {
            ("SERVER", "HOST") => self.config.server.host = value.to_string(),
            ("SERVER", "PORT") => self.config.server.port = parse_port(key, value)?,
            ("SERVER", "ROOT_PREFIX") => self.config.server.root_prefix = value.to_string(),
            ("SERVER", "SHUTDOWN_TIMEOUT_SECS") => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ("SERVER", "REQUEST_TIMEOUT_MS") => {
                self.config.server.request_timeout_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ("LOGGING", "LEVEL") => self.config.logging.level = value.to_string(),
            ("LOGGING", "FORMAT") => {
                self.config.logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(var, format!("expected a port number, got '{value}'")))
}
