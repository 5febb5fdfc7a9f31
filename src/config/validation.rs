//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and addresses.
//! Every problem is reported, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::security::rate_limit::RateLimitConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: window_ms must be greater than zero")]
    ZeroWindow { field: &'static str },

    #[error("{field}: max_requests must be greater than zero")]
    ZeroMaxRequests { field: &'static str },

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("csrf.max_age_secs must be greater than zero")]
    ZeroCookieMaxAge,

    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        "listener.bind_address",
        &config.listener.bind_address,
        &mut errors,
    );
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let limits = &config.rate_limit;
    if limits.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    check_limiter("rate_limit.api", &limits.api, &mut errors);
    check_limiter("rate_limit.search", &limits.search, &mut errors);
    check_limiter("rate_limit.compare", &limits.compare, &mut errors);

    if config.csrf.max_age_secs == 0 {
        errors.push(ValidationError::ZeroCookieMaxAge);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_limiter(field: &'static str, limiter: &RateLimitConfig, errors: &mut Vec<ValidationError>) {
    if limiter.window_ms == 0 {
        errors.push(ValidationError::ZeroWindow { field });
    }
    if limiter.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests { field });
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
