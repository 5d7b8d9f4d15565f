//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files,
//! and every field has a default so a minimal (or absent) config file
//! yields a runnable gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::event_log::{LogConfig, LogLevel};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting for authentication endpoints.
    pub rate_limit: RateLimitConfig,

    /// Event log settings.
    pub logging: LoggingConfig,

    /// Metrics exposition settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on auth endpoints.
    pub enabled: bool,

    /// Maximum requests per identifier per window.
    pub max_requests: u32,

    /// Trailing window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_ms: 60_000,
        }
    }
}

/// Event log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level (debug, info, warn, error).
    pub min_level: String,

    /// Mirror entries to the console.
    pub enable_console: bool,

    /// Emit JSON lines instead of the human-readable format.
    pub enable_structured: bool,

    /// Service name stamped on structured output.
    pub service_name: String,

    /// Environment name (stack traces are suppressed in "production").
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            min_level: "info".to_string(),
            enable_console: true,
            enable_structured: false,
            service_name: "authgate".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Build the runtime log configuration. `LOG_LEVEL`, `SERVICE_NAME`
    /// and `ENVIRONMENT` environment variables override the file values.
    pub fn resolve(&self) -> LogConfig {
        let min_level = std::env::var("LOG_LEVEL")
            .ok()
            .as_deref()
            .unwrap_or(&self.min_level)
            .parse::<LogLevel>()
            .unwrap_or(LogLevel::Info);
        let service_name = std::env::var("SERVICE_NAME")
            .ok()
            .unwrap_or_else(|| self.service_name.clone());
        let environment = std::env::var("ENVIRONMENT")
            .ok()
            .unwrap_or_else(|| self.environment.clone());

        LogConfig {
            min_level,
            enable_console: self.enable_console,
            enable_structured: self.enable_structured,
            service_name,
            environment,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl AdminConfig {
    pub const PLACEHOLDER_API_KEY: &'static str = "CHANGE_ME_IN_PRODUCTION";
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: Self::PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_runnable() {
        let config = GatewayConfig::default();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window(), Duration::from_millis(60_000));
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [rate_limit]
            max_requests = 3

            [logging]
            min_level = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.logging.min_level, "warn");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
