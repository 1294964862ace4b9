//! Precheck configuration.
//!
//! Everything has a default; a TOML file can override any subset:
//!
//! ```toml
//! timeout_ms = 5000
//! store_path = "/var/lib/task/precheck.json"
//!
//! [anthropic]
//! model = "claude-3-haiku-20240307"
//!
//! [github]
//! base_url = "https://ghe.example.com/api/v3"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checks::anthropic::{self, DEFAULT_API_VERSION, DEFAULT_MODEL};
use crate::checks::github;
use crate::http::{Endpoint, HttpConfig, TransportError};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_STORE_PATH: &str = "precheck-results.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Url(#[from] TransportError),
}

/// Anthropic API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub model: String,
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        AnthropicConfig {
            base_url: format!("https://{}", anthropic::API_HOST),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// GitHub API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    pub base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            base_url: format!("https://{}", github::API_HOST),
        }
    }
}

/// Effective configuration after applying the file and command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrecheckConfig {
    /// Bound on connecting and on each read/write of an outbound call
    pub timeout_ms: u64,
    /// File used by the command line tool to persist round results
    pub store_path: PathBuf,
    pub anthropic: AnthropicConfig,
    pub github: GithubConfig,
}

impl Default for PrecheckConfig {
    fn default() -> Self {
        PrecheckConfig {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            anthropic: AnthropicConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl PrecheckConfig {
    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PrecheckConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every check fail for reasons unrelated
    /// to the credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be greater than 0".to_string()));
        }
        if self.anthropic.model.trim().is_empty() {
            return Err(ConfigError::Invalid("anthropic.model must not be empty".to_string()));
        }
        self.anthropic_endpoint()?;
        self.github_endpoint()?;
        Ok(())
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::with_timeout_ms(self.timeout_ms)
    }

    pub fn anthropic_endpoint(&self) -> Result<Endpoint, ConfigError> {
        Ok(Endpoint::parse(&self.anthropic.base_url)?)
    }

    pub fn github_endpoint(&self) -> Result<Endpoint, ConfigError> {
        Ok(Endpoint::parse(&self.github.base_url)?)
    }
}
