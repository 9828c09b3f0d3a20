//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::schema::{OverrideConfig, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{OverrideRegistry, ResponseMatcher, ResponseOverride};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Failed to read override payload {path:?}: {source}")]
    Payload {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid override for {pattern:?}: {message}")]
    Override { pattern: String, message: String },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read one override payload and attach its headers.
pub fn load_override(entry: &OverrideConfig) -> Result<ResponseOverride, ConfigError> {
    let invalid = |message: String| ConfigError::Override {
        pattern: entry.path.clone(),
        message,
    };

    let status = StatusCode::from_u16(entry.status).map_err(|e| invalid(e.to_string()))?;
    let body = fs::read(&entry.body_file).map_err(|source| ConfigError::Payload {
        path: entry.body_file.clone(),
        source,
    })?;
    let content_type =
        HeaderValue::from_str(entry.content_type()).map_err(|e| invalid(e.to_string()))?;

    let mut response = ResponseOverride::new(status, body).with_header(header::CONTENT_TYPE, content_type);
    for (name, values) in &entry.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        for value in values {
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            response = response.with_header(name.clone(), value);
        }
    }

    Ok(response)
}

/// Build the override registry from every configured entry, in order.
pub fn load_overrides(entries: &[OverrideConfig]) -> Result<OverrideRegistry, ConfigError> {
    let mut registry = OverrideRegistry::new();
    for entry in entries {
        let response = load_override(entry)?;
        tracing::debug!(
            pattern = %entry.path,
            status = entry.status,
            body_file = ?entry.body_file,
            bytes = response.body().len(),
            "Override loaded"
        );
        registry.register(ResponseMatcher::new(entry.path.clone()), response);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_payload_with_default_content_type() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"pinned":true}"#).unwrap();

        let entry = OverrideConfig::new("/api/data", file.path());
        let response = load_override(&entry).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), br#"{"pinned":true}"#);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn keeps_multi_valued_headers() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut entry = OverrideConfig::new("/api", file.path());
        entry.status = 404;
        entry.content_type = Some("text/plain".into());
        entry
            .headers
            .insert("set-cookie".into(), vec!["a=1".into(), "b=2".into()]);

        let response = load_override(&entry).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn missing_payload_is_fatal() {
        let entry = OverrideConfig::new("/api", "/definitely/not/here.json");
        assert!(matches!(
            load_override(&entry),
            Err(ConfigError::Payload { .. })
        ));
    }

    #[test]
    fn registry_follows_config_order() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let entries = vec![
            OverrideConfig::new("/api/data", file.path()),
            OverrideConfig::new("/api", file.path()),
        ];
        let registry = load_overrides(&entries).unwrap();
        let patterns: Vec<_> = registry.iter().map(|e| e.matcher().pattern()).collect();
        assert_eq!(patterns, vec!["/api/data", "/api"]);
    }

    #[test]
    fn load_config_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[listener]\nbind_address = \"nowhere\"\n").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}
