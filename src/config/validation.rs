//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("bind address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("collector endpoint {0:?} is not a valid http(s) URL")]
    InvalidCollectorEndpoint(String),

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("export timeout must be greater than zero")]
    ZeroExportTimeout,
}

/// Check a deserialized configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.telemetry.collector_endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => errors.push(ValidationError::InvalidCollectorEndpoint(
            config.telemetry.collector_endpoint.clone(),
        )),
    }

    if config.telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if config.telemetry.export_timeout_ms == 0 {
        errors.push(ValidationError::ZeroExportTimeout);
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
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_all_errors_at_once() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.telemetry.collector_endpoint = "ftp://collector:4318".to_string();
        config.telemetry.service_name = "  ".to_string();
        config.telemetry.export_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyServiceName));
        assert!(errors.contains(&ValidationError::ZeroExportTimeout));
    }

    #[test]
    fn https_collector_is_accepted() {
        let mut config = ServiceConfig::default();
        config.telemetry.collector_endpoint = "https://collector.example.com:4318".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
