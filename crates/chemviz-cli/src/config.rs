//! Configuration management for the chemviz CLI
//!
//! Server URL, where the session is kept, request timeout and how much
//! history to show.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default server URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Default timeout for API requests in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;

/// Number of datasets `history` shows by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// chemviz server URL
    pub server_url: String,

    /// File holding the access/refresh token pair
    pub session_file: PathBuf,

    /// Per-request timeout
    pub api_timeout_secs: u64,

    /// Default number of datasets listed by `history`
    pub history_limit: usize,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Result<Self> {
        let session_file = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?
            .join("chemviz")
            .join("session.json");

        Ok(Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session_file,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new().unwrap_or_default();

        if let Ok(url) = std::env::var("CHEMVIZ_SERVER_URL") {
            config.server_url = url;
        }

        if let Ok(path) = std::env::var("CHEMVIZ_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }

        if let Ok(secs) = std::env::var("CHEMVIZ_API_TIMEOUT_SECS") {
            config.api_timeout_secs = secs
                .parse()
                .map_err(|_| CliError::config(format!("Invalid CHEMVIZ_API_TIMEOUT_SECS '{}'", secs)))?;
        }

        if let Ok(limit) = std::env::var("CHEMVIZ_HISTORY_LIMIT") {
            config.history_limit = limit
                .parse()
                .map_err(|_| CliError::config(format!("Invalid CHEMVIZ_HISTORY_LIMIT '{}'", limit)))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(CliError::config(format!(
                "Server URL '{}' must start with http:// or https://",
                self.server_url
            )));
        }
        if self.api_timeout_secs == 0 {
            return Err(CliError::config("API timeout must be greater than 0"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn server_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session_file: PathBuf::from(".chemviz-session.json"),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }
}
