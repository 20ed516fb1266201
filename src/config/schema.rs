//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::tracing::TracerKind;

/// Root configuration for the catalog service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Identity reported by the liveness endpoint.
    pub service: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Injected latency at startup.
    pub latency: LatencyConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8082").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8082".to_string(),
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name reported by liveness (env: `SERVICE_NAME`).
    pub name: String,

    /// Version reported by liveness (env: `CATALOG_VERSION`).
    pub version: String,
}

pub const DEFAULT_SERVICE_NAME: &str = "catalog";
pub const DEFAULT_VERSION: &str = "v1";

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Span reporting backend.
    pub tracer: TracerKind,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9092".to_string(),
            tracer: TracerKind::Log,
        }
    }
}

/// Latency injection defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LatencyConfig {
    /// Delay applied to read paths until changed via the admin endpoint.
    pub initial_ms: i64,
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: CatalogConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8082");
        assert_eq!(config.service, ServiceConfig::default());
        assert_eq!(config.observability.tracer, TracerKind::Log);
        assert_eq!(config.latency.initial_ms, 0);
    }

    #[test]
    fn test_partial_sections() {
        let config: CatalogConfig = toml::from_str(
            r#"
            [service]
            version = "v2"

            [observability]
            log_format = "json"
            tracer = "noop"

            [latency]
            initial_ms = 150
            "#,
        )
        .unwrap();
        assert_eq!(config.service.name, "catalog");
        assert_eq!(config.service.version, "v2");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.tracer, TracerKind::Noop);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.latency.initial_ms, 150);
    }
}
