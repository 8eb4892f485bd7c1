use std::net::IpAddr;

use crate::config::models::{ServerConfig, StopMode};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("Invalid advertised host '{host}': {reason}")]
    InvalidAdvertisedHost { host: String, reason: String },

    #[error("Invalid stop mode: {message}")]
    InvalidStopMode { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Some(addr) = config.bind_addr.as_deref() {
            if let Err(e) = addr.parse::<IpAddr>() {
                errors.push(ValidationError::InvalidBindAddress {
                    address: addr.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        if let Some(host) = config.advertised_host.as_deref() {
            if host.trim().is_empty() || host.contains(char::is_whitespace) {
                errors.push(ValidationError::InvalidAdvertisedHost {
                    host: host.to_string(),
                    reason: "must be a non-empty hostname without whitespace".to_string(),
                });
            }
        }

        if let StopMode::Graceful { timeout } = config.stop_mode {
            if timeout.is_zero() {
                errors.push(ValidationError::InvalidStopMode {
                    message: "graceful timeout must be greater than zero \
                              (use type = \"immediate\" for no grace period)"
                        .to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.swap_remove(0))
        } else {
            Err(ValidationError::ValidationFailed {
                message: errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unparseable_bind_address() {
        let config = ServerConfig::new(0).with_bind_addr("localhost");
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBindAddress { .. }));
    }

    #[test]
    fn rejects_zero_grace_timeout() {
        let config =
            ServerConfig::ephemeral().with_stop_mode(StopMode::graceful(Duration::ZERO));
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStopMode { .. }));
    }

    #[test]
    fn rejects_blank_advertised_host() {
        let config = ServerConfig::ephemeral().with_advertised_host("  ");
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAdvertisedHost { .. }));
    }

    #[test]
    fn multiple_problems_are_combined() {
        let config = ServerConfig::new(0)
            .with_bind_addr("nope")
            .with_stop_mode(StopMode::graceful(Duration::ZERO));
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::ValidationFailed { .. }));
    }
}
