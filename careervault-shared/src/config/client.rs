use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_BASE_URL: &str = "CAREERVAULT_API_BASE_URL";
const ENV_LOG_LEVEL: &str = "CAREERVAULT_LOG_LEVEL";
const ENV_TOKEN_PATH: &str = "CAREERVAULT_TOKEN_PATH";
const ENV_TIMEOUT: &str = "CAREERVAULT_REQUEST_TIMEOUT_SECS";

/// Errors raised while resolving the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported configuration format for {0}. Use 'yaml' or 'json'.")]
    UnsupportedFormat(PathBuf),
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {name} value: {message}")]
    InvalidEnv { name: &'static str, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for talking to the CareerVault backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the REST backend.
    pub base_url: Url,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Where the session's tokens are persisted; see [`default_token_path`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,

    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never: the default base URL is a valid constant.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            token_path: None,
            request_timeout_secs: None,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Environment variables only apply where the file left the default in place, and
    /// `base_url_override` (the command-line flag) wins over both.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a `.yaml`/`.yml` or `.json` file.
    /// * `base_url_override` - Optional backend origin from the command line.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an environment
    /// variable holds an invalid value, or the resolved configuration is invalid.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => defaults.clone(),
        };

        if config.base_url == defaults.base_url {
            if let Ok(value) = env::var(ENV_BASE_URL) {
                config.base_url =
                    Url::parse(value.trim()).map_err(|err| ConfigError::InvalidEnv {
                        name: ENV_BASE_URL,
                        message: err.to_string(),
                    })?;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(value) = env::var(ENV_LOG_LEVEL) {
                config.log_level = value;
            }
        }
        if config.token_path.is_none() {
            if let Ok(value) = env::var(ENV_TOKEN_PATH) {
                config.token_path = Some(PathBuf::from(value));
            }
        }
        if config.request_timeout_secs.is_none() {
            if let Ok(value) = env::var(ENV_TIMEOUT) {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidEnv {
                        name: ENV_TIMEOUT,
                        message: "must be a whole number of seconds".to_string(),
                    })?;
                config.request_timeout_secs = Some(secs);
            }
        }

        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }

        if let Err(errors) = config.validate() {
            return Err(ConfigError::Invalid(errors.join("; ")));
        }

        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path)),
        }
    }

    /// Resolved token file location.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(default_token_path)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration, collecting every problem found.
    ///
    /// # Errors
    /// Returns the list of human-readable problems.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.base_url.scheme(), "http" | "https") {
            errors.push(format!(
                "base_url must use http or https, got '{}'",
                self.base_url.scheme()
            ));
        }
        if self.base_url.cannot_be_a_base() {
            errors.push("base_url must be an absolute origin".to_string());
        }
        if self.request_timeout_secs == Some(0) {
            errors.push("request_timeout_secs must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// `<config dir>/careervault/session.json`, or `./session.json` when no home is known.
#[must_use]
pub fn default_token_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("careervault").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./session.json"))
}
