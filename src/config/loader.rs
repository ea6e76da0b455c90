use super::types::*;
use crate::strategies::ServiceType;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown service type '{0}' in [images]")]
    UnknownServiceType(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    let global = &config.global;

    if global.host.trim().is_empty() {
        return Err(ConfigError::ValidationError("host must not be empty".to_string()));
    }

    if global.docker_timeout_seconds == 0 || global.backup_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "timeouts must be greater than zero".to_string(),
        ));
    }

    if global.max_port_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "max_port_attempts must be at least 1".to_string(),
        ));
    }

    for (service_type, image) in &config.images {
        if service_type.parse::<ServiceType>().is_err() {
            return Err(ConfigError::UnknownServiceType(service_type.clone()));
        }
        if image.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "image for '{}' must not be empty",
                service_type
            )));
        }
    }

    Ok(())
}
