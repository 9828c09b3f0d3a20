//! Upstream forwarding.
//!
//! # Responsibilities
//! - Hold the one upstream target and the pooled HTTPS client
//! - Rewrite the request URI and Host header for the upstream hop
//! - Stream the upstream response back unmodified (minus hop headers)
//! - Map transport failures to gateway responses
//!
//! # Design Decisions
//! - The URI authority is the upstream *address*; the Host header is the
//!   configured *host*. They differ on purpose.
//! - HTTP/1.1 to the upstream regardless of the inbound protocol
//! - No retries: a failed attempt is reported to the client as is

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Request, Response, StatusCode, Uri, Version};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::headers::{prepare_upstream_headers, remove_hop_headers};
use crate::net::tls::upstream_client_config;

/// Pooled HTTPS client used for every forwarded request.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Errors raised while building or using the forwarder.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: axum::http::uri::InvalidUri,
    },

    #[error("invalid upstream host {0:?}")]
    InvalidHost(String),

    #[error("upstream TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidAddress { .. } | ForwardError::InvalidHost(_) => "config",
            ForwardError::Tls(_) => "tls",
            ForwardError::Request(_) => "request",
            ForwardError::Upstream(_) => "upstream",
            ForwardError::Timeout(_) => "timeout",
        }
    }

    /// Status the client sees for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> axum::response::Response {
        let message = match self.status() {
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            _ => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

/// Sends requests to the single configured upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    authority: Authority,
    host: HeaderValue,
    timeout: Duration,
}

impl Forwarder {
    /// Build the forwarder and its connection pool.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let authority: Authority =
            upstream
                .address
                .parse()
                .map_err(|source| ForwardError::InvalidAddress {
                    address: upstream.address.clone(),
                    source,
                })?;
        let host = HeaderValue::from_str(&upstream.host)
            .map_err(|_| ForwardError::InvalidHost(upstream.host.clone()))?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let tls = upstream_client_config(upstream.skip_certificate_verification)?;
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_only()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            authority,
            host,
            timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Address the upstream connection is made to.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Host header presented to the upstream.
    pub fn host(&self) -> &HeaderValue {
        &self.host
    }

    /// The upstream URI for an inbound request target.
    pub fn upstream_uri(&self, original: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = original
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Uri::builder()
            .scheme(Scheme::HTTPS)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Forward a request and stream back the upstream's response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        prepare_upstream_headers(&mut parts.headers, &self.host, client_addr);

        let upstream_request = Request::from_parts(parts, body);
        let response: Response<Incoming> =
            tokio::time::timeout(self.timeout, self.client.request(upstream_request))
                .await
                .map_err(|_| ForwardError::Timeout(self.timeout))??;

        let (mut parts, body) = response.into_parts();
        remove_hop_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
