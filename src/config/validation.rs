//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, timeouts > 0)
//! - Refuse obviously unsafe settings (placeholder admin key)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AdminConfig, GatewayConfig};
use crate::observability::event_log::LogLevel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    ZeroMaxRequests,
    ZeroWindow,
    ZeroRequestTimeout,
    UnknownLogLevel(String),
    PlaceholderAdminKey,
    InvalidMetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address is not a socket address: {addr}")
            }
            ValidationError::ZeroMaxRequests => {
                write!(f, "rate_limit.max_requests must be > 0 when enabled")
            }
            ValidationError::ZeroWindow => {
                write!(f, "rate_limit.window_ms must be > 0 when enabled")
            }
            ValidationError::ZeroRequestTimeout => {
                write!(f, "timeouts.request_secs must be > 0")
            }
            ValidationError::UnknownLogLevel(level) => {
                write!(f, "logging.min_level is not a log level: {level}")
            }
            ValidationError::PlaceholderAdminKey => {
                write!(f, "admin.api_key must be set when the admin API is enabled")
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address is not a socket address: {addr}")
            }
        }
    }
}

/// Validate a loaded configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests);
        }
        if config.rate_limit.window_ms == 0 {
            errors.push(ValidationError::ZeroWindow);
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.logging.min_level.parse::<LogLevel>().is_err() {
        errors.push(ValidationError::UnknownLogLevel(
            config.logging.min_level.clone(),
        ));
    }

    if config.admin.enabled
        && (config.admin.api_key.is_empty()
            || config.admin.api_key == AdminConfig::PLACEHOLDER_API_KEY)
    {
        errors.push(ValidationError::PlaceholderAdminKey);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_ms = 0;
        config.logging.min_level = "verbose".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroMaxRequests));
        assert!(errors.contains(&ValidationError::ZeroWindow));
    }

    #[test]
    fn test_disabled_rate_limit_skips_range_checks() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_admin_requires_real_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::PlaceholderAdminKey));

        config.admin.api_key = "a-real-key".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
