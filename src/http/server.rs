//! HTTPS server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all dispatch handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve over TLS until a graceful shutdown is requested
//! - Dispatch each request to the override responder or the forwarder
//! - Observability (logs, metrics) for both paths

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::forwarder::{ForwardError, Forwarder};
use crate::http::request::{request_id, request_id_layer};
use crate::http::response::override_response;
use crate::observability::metrics;
use crate::routing::{request_key, OverrideRegistry, RouteDecision, Router as ProxyRouter};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address {address:?}: {source}")]
    BindAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error(transparent)]
    Forwarder(#[from] ForwardError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub forwarder: Forwarder,
}

/// HTTPS server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new server from a validated configuration and a frozen
    /// override registry.
    pub fn new(config: ProxyConfig, registry: OverrideRegistry) -> Result<Self, ServerError> {
        let forwarder = Forwarder::new(&config.upstream, &config.timeouts)?;
        let state = AppState {
            router: Arc::new(ProxyRouter::new(registry)),
            forwarder,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, e.g. for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve over TLS until `handle` is told to shut down.
    pub async fn run(self, tls: RustlsConfig, handle: Handle) -> Result<(), ServerError> {
        let addr = self
            .config
            .listener
            .socket_addr()
            .map_err(|source| ServerError::BindAddress {
                address: self.config.listener.bind_address.clone(),
                source,
            })?;

        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            upstream_host = %self.config.upstream.host,
            overrides = self.config.overrides.len(),
            "HTTPS server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls).handle(handle).serve(app).await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main handler: serve an override, or forward to the upstream.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let key = request_key(request.uri());
    let decision = state.router.route(&key);

    match decision {
        RouteDecision::Override(entry) => {
            let canned = entry.response();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                key = %key,
                pattern = %entry.matcher().pattern(),
                status = canned.status().as_u16(),
                "Overriding response"
            );
            metrics::record_request(decision.label(), canned.status().as_u16(), start_time);
            override_response(canned)
        }
        RouteDecision::Forward => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                key = %key,
                upstream = %state.forwarder.authority(),
                "Proxying request"
            );
            let client_addr = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);

            match state.forwarder.forward(request, client_addr).await {
                Ok(response) => {
                    tracing::debug!(
                        request_id = %request_id,
                        status = response.status().as_u16(),
                        "Upstream responded"
                    );
                    metrics::record_request(decision.label(), response.status().as_u16(), start_time);
                    response
                }
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                    metrics::record_upstream_error(e.kind());
                    metrics::record_request(decision.label(), e.status().as_u16(), start_time);
                    e.into_response()
                }
            }
        }
    }
}
