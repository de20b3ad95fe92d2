use std::fs;
use tracing::{debug, error, info};

use crate::types::server_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.database.path.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "database.path cannot be empty".into(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::InvalidConfig(
            "database.max_connections must be greater than 0".into(),
        ));
    }

    if config.auth.access_token_ttl_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "access_token_ttl_minutes must be greater than 0".into(),
        ));
    }

    if config.auth.refresh_token_ttl_hours == 0 {
        return Err(ConfigError::InvalidConfig(
            "refresh_token_ttl_hours must be greater than 0".into(),
        ));
    }

    // Both secrets must be resolvable (env var or config field) before the
    // server starts — a missing one would otherwise only surface at the
    // first signup or login.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < 32 => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be at least 32 characters long".into(),
            ));
        }
        _ => {}
    }

    if config.auth.resolved_password_salt().is_none() {
        return Err(ConfigError::InvalidConfig(
            "password_salt must be set via the PASSWORD_SALT env var or auth.password_salt config field"
                .into(),
        ));
    }

    Ok(())
}
