//! Server configuration, read from the environment (and `.env`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Seconds in-flight requests get to finish after a shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL; `mode=rwc` creates the file on first start.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://chemviz.db?mode=rwc";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// The web dashboard's dev server.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default directory for uploaded files.
pub const DEFAULT_MEDIA_ROOT: &str = "./media";

/// Default account name.
pub const DEFAULT_AUTH_USERNAME: &str = "admin";

/// Default access token lifetime (5 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 300;

/// Default refresh token lifetime (1 day).
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 86_400;

/// Everything the server reads at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// SQLite pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Browser origins allowed to call the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Uploaded file storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
}

/// Account and token lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Read `.env`, then the process environment, then validate.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }

        let config = Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cors: CorsConfig::from_env(),
            media: MediaConfig::from_env(),
            auth: AuthConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.server.port != 0, "CHEMVIZ_PORT must not be 0");
        anyhow::ensure!(!self.database.url.is_empty(), "DATABASE_URL is empty");
        anyhow::ensure!(
            self.database.max_connections > 0,
            "DATABASE_MAX_CONNECTIONS must be at least 1"
        );
        anyhow::ensure!(
            !self.auth.username.trim().is_empty() && !self.auth.password.is_empty(),
            "CHEMVIZ_AUTH_USERNAME and CHEMVIZ_AUTH_PASSWORD must both be set"
        );
        anyhow::ensure!(
            self.auth.access_ttl_secs > 0 && self.auth.refresh_ttl_secs > 0,
            "Token lifetimes must be positive"
        );

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty, any origin will be accepted");
        }
        Ok(())
    }
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_string("CHEMVIZ_HOST", DEFAULT_SERVER_HOST),
            port: env_or("CHEMVIZ_PORT", DEFAULT_SERVER_PORT),
            shutdown_timeout_secs: env_or("CHEMVIZ_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Self {
        Self {
            url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
            connect_timeout_secs: env_or(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            ),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl CorsConfig {
    fn from_env() -> Self {
        Self {
            allowed_origins: split_origins(&env_string(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_CORS_ALLOWED_ORIGIN,
            )),
            allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
            allow_credentials: true,
        }
    }
}

/// Comma-separated origin list, blanks dropped.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl MediaConfig {
    fn from_env() -> Self {
        Self {
            root: PathBuf::from(env_string("CHEMVIZ_MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_MEDIA_ROOT),
        }
    }
}

impl AuthConfig {
    fn from_env() -> Self {
        Self {
            username: env_string("CHEMVIZ_AUTH_USERNAME", DEFAULT_AUTH_USERNAME),
            password: std::env::var("CHEMVIZ_AUTH_PASSWORD").unwrap_or_default(),
            access_ttl_secs: env_or("CHEMVIZ_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl_secs: env_or("CHEMVIZ_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS),
        }
    }
}

/// No password: `validate` refuses to start until one is configured.
impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_AUTH_USERNAME.to_string(),
            password: String::new(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid() -> Config {
        let mut config = Config::default();
        config.auth.password = "secret".to_string();
        config
    }

    #[test]
    fn test_default_requires_password() {
        assert!(Config::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = valid();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = valid();
        config.auth.access_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_origins() {
        assert_eq!(split_origins(" http://a.test,,http://b.test "), vec!["http://a.test", "http://b.test"]);
        assert!(split_origins("").is_empty());
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        std::env::set_var("CHEMVIZ_PORT", "9100");
        std::env::set_var("CHEMVIZ_AUTH_PASSWORD", "hunter2");
        std::env::set_var("CHEMVIZ_MEDIA_ROOT", "/tmp/chemviz-media");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.media.root, PathBuf::from("/tmp/chemviz-media"));
        assert_eq!(config.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);

        std::env::remove_var("CHEMVIZ_PORT");
        std::env::remove_var("CHEMVIZ_AUTH_PASSWORD");
        std::env::remove_var("CHEMVIZ_MEDIA_ROOT");
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
    }
}
