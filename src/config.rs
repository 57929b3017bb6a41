//! Client configuration, read from TOML with environment overrides.

use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

const DEFAULT_SERVER_URL: &str = "https://api.mycroft.ai";
const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid server URL {url:?}: {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
}

/// Where the backend lives.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, without the API version. Used verbatim.
    pub url: String,
    /// The API version used when a request doesn't ask for one.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound on a single HTTP round trip.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Loads configuration from `path` if given (defaults otherwise),
    /// then applies any `CLOUDLINK_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("CLOUDLINK_SERVER_URL") {
            self.server.url = url;
        }
        if let Some(version) = lookup("CLOUDLINK_API_VERSION") {
            self.server.version = version;
        }
        if let Some(timeout) = lookup("CLOUDLINK_TIMEOUT_SECS") {
            self.http.timeout_secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CLOUDLINK_TIMEOUT_SECS",
                value: timeout,
            })?;
        }
        Ok(())
    }

    /// We only check that the server URL parses; it's still used exactly as written.
    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.server.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server.url.clone(),
            source,
        })?;
        if self.server.version.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "server.version",
                value: self.server.version.clone(),
            });
        }
        Ok(())
    }
}
