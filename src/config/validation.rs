//! Configuration validation.
//!
//! Serde handles syntax; these checks cover value ranges and address shapes.
//! Every error is collected so a bad file is reported in one pass.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, ListenerConfig, ServiceConfig};
use crate::load_balancer::instance::Instance;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("instance '{address}' is invalid: {reason}")]
    Instance { address: String, reason: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("circuit_breaker.failure_rate_threshold {0} must be in (0, 1]")]
    FailureRate(f64),

    #[error("catalog_path must not be empty")]
    CatalogPath,

    #[error("product '{code}' price {price} must be a non-negative number")]
    Price { code: String, price: f64 },

    #[error("partner '{partner}' discount {discount} must be in [0, 1]")]
    Discount { partner: String, discount: f64 },
}

/// Validate a gateway configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_listener(&config.listener, &mut errors);

    for address in config.instances.as_slice() {
        if let Err(e) = Instance::parse(address) {
            errors.push(ValidationError::Instance {
                address: address.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero { field: "retries.max_attempts" });
    }
    if config.retries.max_time_ms == 0 {
        errors.push(ValidationError::Zero { field: "retries.max_time_ms" });
    }

    if config.rate_limit.enabled {
        if config.rate_limit.requests_per_second == 0 {
            errors.push(ValidationError::Zero { field: "rate_limit.requests_per_second" });
        }
        if config.rate_limit.burst_size == 0 {
            errors.push(ValidationError::Zero { field: "rate_limit.burst_size" });
        }
    }

    let cb = &config.circuit_breaker;
    if cb.enabled {
        if cb.half_open_max_requests == 0 {
            errors.push(ValidationError::Zero { field: "circuit_breaker.half_open_max_requests" });
        }
        if cb.cooldown_ms == 0 {
            errors.push(ValidationError::Zero { field: "circuit_breaker.cooldown_ms" });
        }
        if let Some(rate) = cb.failure_rate_threshold {
            if !(rate > 0.0 && rate <= 1.0) {
                errors.push(ValidationError::FailureRate(rate));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a price-service configuration.
pub fn validate_service_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_listener(&config.listener, &mut errors);
    if config.catalog_path.trim().is_empty() {
        errors.push(ValidationError::CatalogPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_listener(listener: &ListenerConfig, errors: &mut Vec<ValidationError>) {
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(listener.bind_address.clone()));
    }
    if listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }
    if listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::InstanceList;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
        assert!(validate_service_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nope".into();
        config.instances = InstanceList::parse("localhost:8081,no-port");
        config.retries.max_attempts = 0;
        config.circuit_breaker.failure_rate_threshold = Some(1.5);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::BindAddress("nope".into())));
        assert!(errors.contains(&ValidationError::Zero { field: "retries.max_attempts" }));
        assert!(errors.contains(&ValidationError::FailureRate(1.5)));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Instance { address, .. } if address == "no-port")));
    }

    #[test]
    fn test_disabled_limiter_skips_checks() {
        let mut config = GatewayConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.requests_per_second = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_instance_list_is_allowed() {
        let mut config = GatewayConfig::default();
        config.instances = InstanceList(Vec::new());
        assert!(validate_config(&config).is_ok());
    }
}
