//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, host names and header values
//! - Validate value ranges (timeouts > 0, status codes)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Override patterns are NOT validated here: an unparseable pattern is
//!   skipped at match time instead of stopping the proxy

use std::net::SocketAddr;

use axum::http::uri::Authority;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    let host = &config.upstream.host;
    if host.is_empty() || HeaderValue::from_str(host).is_err() {
        errors.push(ValidationError::new(
            "upstream.host",
            format!("{host:?} is not a valid Host header value"),
        ));
    }

    let address = &config.upstream.address;
    if address.is_empty() || address.parse::<Authority>().is_err() {
        errors.push(ValidationError::new(
            "upstream.address",
            format!("{address:?} is not a network address"),
        ));
    }

    let timeouts = [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "{:?} is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    for (i, entry) in config.overrides.iter().enumerate() {
        let field = format!("overrides[{i}]");

        if StatusCode::from_u16(entry.status).is_err() {
            errors.push(ValidationError::new(
                format!("{field}.status"),
                format!("{} is not an HTTP status code", entry.status),
            ));
        }
        if HeaderValue::from_str(entry.content_type()).is_err() {
            errors.push(ValidationError::new(
                format!("{field}.content_type"),
                format!("{:?} is not a valid header value", entry.content_type()),
            ));
        }
        for (name, values) in &entry.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::new(
                    format!("{field}.headers"),
                    format!("{name:?} is not a valid header name"),
                ));
            }
            if values.iter().any(|v| HeaderValue::from_str(v).is_err()) {
                errors.push(ValidationError::new(
                    format!("{field}.headers.{name}"),
                    "contains an invalid header value",
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
