//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and load override payloads
//! - Load the listener certificate
//! - Start background tasks (metrics, signal handling)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{load_overrides, ConfigError, ProxyConfig};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::trigger_on_signal;
use crate::net::tls::{install_crypto_provider, load_tls_config};
use crate::observability::metrics;

/// Anything that keeps the proxy from starting or makes it stop.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load listener certificate: {0}")]
    Tls(std::io::Error),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(String),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Bring the proxy up and serve until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    install_crypto_provider();

    let registry = load_overrides(&config.overrides)?;
    let skipped = registry.iter().filter(|e| e.matcher().key().is_none()).count();
    tracing::info!(
        overrides = registry.len(),
        unparseable = skipped,
        "Override registry ready"
    );

    let tls = load_tls_config(&config.listener.tls.cert_path, &config.listener.tls.key_path)
        .await
        .map_err(StartupError::Tls)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let server = HttpServer::new(config, registry)?;

    let shutdown = Arc::new(Shutdown::new());
    let handle = Handle::new();
    trigger_on_signal(&shutdown);
    shutdown.drain_on_trigger(handle.clone(), grace);

    server.run(tls, handle).await?;
    Ok(())
}
