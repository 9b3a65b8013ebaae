//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. Validation is a pure
//! function that reports every problem it finds, not just the first.
//!
//! The datastore URI is not checked here. A malformed URI surfaces as a
//! connection failure, which the connector logs and tolerates.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.json_body_limit == 0 {
        errors.push(ValidationError::new("http.json_body_limit", "must be greater than 0"));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }
    if config.datastore.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("datastore.connect_timeout_secs", "must be greater than 0"));
    }
    if config.datastore.server_selection_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "datastore.server_selection_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
