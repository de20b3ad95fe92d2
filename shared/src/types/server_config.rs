use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_db_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Lifetime of a minted access token.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_ttl_minutes: u64,

    /// Lifetime of a session between refreshes. Each successful refresh
    /// pushes the session expiry forward by this amount.
    #[serde(default = "default_refresh_ttl_hours")]
    pub refresh_token_ttl_hours: u64,

    /// HMAC key used to sign and verify access tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable. This
    /// config field is the fallback for deployments that cannot inject env
    /// vars at runtime.
    ///
    /// **Minimum length:** 32 characters. The server reads it once at
    /// startup; rotating it invalidates every outstanding access token.
    pub jwt_secret: Option<String>,

    /// Process-wide salt mixed into every password digest.
    ///
    /// Prefer the `PASSWORD_SALT` environment variable over this field.
    /// Changing it orphans every stored digest, so it is effectively
    /// write-once per deployment.
    pub password_salt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:8000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes * 60)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_hours * 3600)
    }

    /// Resolve the signing secret with the `JWT_SECRET` env var taking
    /// priority over the config file field.
    ///
    /// Returns `None` when neither source is set (startup treats this as
    /// a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }

    /// Resolve the digest salt with the `PASSWORD_SALT` env var taking
    /// priority over the config file field.
    pub fn resolved_password_salt(&self) -> Option<String> {
        std::env::var("PASSWORD_SALT")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.password_salt.clone())
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    8000
}

pub fn default_db_connections() -> u32 {
    5
}

pub fn default_access_ttl_minutes() -> u64 {
    15
}

pub fn default_refresh_ttl_hours() -> u64 {
    24
}
