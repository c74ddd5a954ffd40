//! Startup configuration for chirpy
//!
//! Read once from a YAML file (with `${VAR}` expansion) or from `CHIRPY_*`
//! environment variables, validated, then turned into the immutable
//! [`auth::AuthConfig`] the session layer shares.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth;

/// Environment variable prefix for `Config::from_env`
pub const ENV_PREFIX: &str = "CHIRPY_";

/// Top-level settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthSettings,

    /// Deployment platform name (e.g. "dev", "prod")
    #[serde(default)]
    pub platform: String,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix CHIRPY_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Server config from env
        if let Some(host) = env_var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_var("SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid port number".to_string()))?;
        }

        // Auth config from env
        if let Some(secret) = env_var("AUTH_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Some(key) = env_var("AUTH_POLKA_KEY") {
            config.auth.polka_key = key;
        }
        if let Some(ttl) = env_var("AUTH_ACCESS_TOKEN_TTL_SECS") {
            config.auth.access_token_ttl_secs = ttl.parse().map_err(|_| {
                ConfigError::Parse("Invalid access token ttl".to_string())
            })?;
        }
        if let Some(ttl) = env_var("AUTH_REFRESH_TOKEN_TTL_DAYS") {
            config.auth.refresh_token_ttl_days = ttl.parse().map_err(|_| {
                ConfigError::Parse("Invalid refresh token ttl".to_string())
            })?;
        }

        if let Some(platform) = env_var("PLATFORM") {
            config.platform = platform;
        }

        // Database config from env
        if let Some(path) = env_var("DATABASE_PATH") {
            config.database.path = path;
        }

        // Logging config from env
        if let Some(level) = env_var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Check that required settings are present and values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.polka_key.is_empty() {
            return Err(ConfigError::MissingRequired("auth.polka_key".to_string()));
        }
        if self.platform.is_empty() {
            return Err(ConfigError::MissingRequired("platform".to_string()));
        }
        if self.auth.access_token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_ttl_days must be positive".to_string(),
            ));
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::MissingRequired("database.path".to_string()));
        }
        Ok(())
    }

    /// Runtime auth configuration derived from the `auth` section
    pub fn auth_config(&self) -> auth::AuthConfig {
        auth::AuthConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            polka_key: self.auth.polka_key.clone(),
            access_token_ttl: chrono::Duration::seconds(self.auth.access_token_ttl_secs),
            refresh_token_ttl: chrono::Duration::days(self.auth.refresh_token_ttl_days),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSettings {
    /// HMAC secret for signing access tokens
    #[serde(default)]
    pub jwt_secret: String,

    /// API key expected from the payment provider webhook
    #[serde(default)]
    pub polka_key: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_days: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            polka_key: String::new(),
            access_token_ttl_secs: default_access_token_ttl(),
            refresh_token_ttl_days: default_refresh_token_ttl(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("polka_key", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

fn default_access_token_ttl() -> i64 {
    auth::DEFAULT_ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_token_ttl() -> i64 {
    auth::DEFAULT_REFRESH_TOKEN_TTL_DAYS
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "chirpy.db".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax; unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return input.to_string(),
    };

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
