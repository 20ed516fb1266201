//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{CatalogConfig, LogFormat};
use crate::config::validation::{is_host_port, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_VERSION: &str = "CATALOG_VERSION";
pub const ENV_SERVICE_NAME: &str = "SERVICE_NAME";
pub const ENV_PORT: &str = "CATALOG_PORT";
pub const ENV_LOG_FORMAT: &str = "CATALOG_LOG_FORMAT";

/// Load configuration: file (if any) → process environment → validation.
pub fn load(path: Option<&Path>) -> Result<CatalogConfig, ConfigError> {
    load_with(path, |var| std::env::var(var).ok())
}

/// Like [`load`] with an injected environment lookup.
pub fn load_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CatalogConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => CatalogConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn parse_file(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides. Empty values are treated as unset.
pub fn apply_env_overrides(
    config: &mut CatalogConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(version) = get(ENV_VERSION) {
        config.service.version = version;
    }
    if let Some(name) = get(ENV_SERVICE_NAME) {
        config.service.name = name;
    }
    if let Some(port) = get(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            value: port.clone(),
        })?;
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    if let Some(format) = get(ENV_LOG_FORMAT) {
        config.observability.log_format = match format.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    var: ENV_LOG_FORMAT,
                    value: format,
                })
            }
        };
    }
    Ok(())
}

fn with_port(bind_address: &str, port: u16) -> String {
    let host = if is_host_port(bind_address) {
        bind_address.rsplit_once(':').map(|(h, _)| h).unwrap_or("0.0.0.0")
    } else {
        "0.0.0.0"
    };
    format!("{host}:{port}")
}
