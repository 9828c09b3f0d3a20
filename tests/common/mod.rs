//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::routing::any;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use override_proxy::config::ProxyConfig;
use override_proxy::net::tls::install_crypto_provider;
use override_proxy::{HttpServer, OverrideRegistry};

/// What the stub upstream saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub host: Option<String>,
    pub target: String,
    pub forwarded_for: Option<String>,
    pub session: Option<String>,
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Requests to this path are answered only after [`SLOW_DELAY`].
pub const SLOW_PATH: &str = "/slow";
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// A TLS upstream with a self-signed certificate that records every call.
pub struct StubUpstream {
    pub addr: SocketAddr,
    recorder: Recorder,
    handle: Handle,
}

impl StubUpstream {
    pub fn calls(&self) -> usize {
        self.recorder.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.recorder.seen.lock().unwrap().clone()
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

async fn record(State(recorder): State<Recorder>, uri: Uri, headers: HeaderMap) -> (HeaderMap, String) {
    recorder.calls.fetch_add(1, Ordering::SeqCst);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    recorder.seen.lock().unwrap().push(SeenRequest {
        host: header("host"),
        target: uri.to_string(),
        forwarded_for: header("x-forwarded-for"),
        session: header("x-session"),
    });

    if uri.path() == SLOW_PATH {
        tokio::time::sleep(SLOW_DELAY).await;
    }

    let mut reply = HeaderMap::new();
    reply.insert("x-upstream", "stub".parse().unwrap());
    (reply, format!("upstream saw {uri}"))
}

/// Self-signed certificate and key, PEM encoded.
pub fn self_signed_pem() -> (Vec<u8>, Vec<u8>) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    (cert.pem().into_bytes(), key_pair.serialize_pem().into_bytes())
}

pub async fn self_signed_tls() -> RustlsConfig {
    install_crypto_provider();
    let (cert, key) = self_signed_pem();
    RustlsConfig::from_pem(cert, key).await.unwrap()
}

/// Start the stub upstream on an ephemeral port.
pub async fn start_stub_upstream() -> StubUpstream {
    let recorder = Recorder::default();
    let app = axum::Router::new()
        .route("/", any(record))
        .route("/{*path}", any(record))
        .with_state(recorder.clone());

    let tls = self_signed_tls().await;
    let handle = Handle::new();
    let server_handle = handle.clone();
    tokio::spawn(async move {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let _ = axum_server::bind_rustls(addr, tls)
            .handle(server_handle)
            .serve(app.into_make_service())
            .await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(5), handle.listening())
        .await
        .unwrap()
        .expect("stub upstream failed to bind");

    StubUpstream {
        addr,
        recorder,
        handle,
    }
}

/// An address nothing listens on.
pub fn unreachable_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Proxy configuration pointing at `upstream`.
pub fn proxy_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.host = "api.example.test".into();
    config.upstream.address = upstream.to_string();
    config.upstream.skip_certificate_verification = true;
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    config
}

/// The proxy's layered axum router, ready for `oneshot`.
pub fn proxy_app(config: ProxyConfig, registry: OverrideRegistry) -> axum::Router {
    install_crypto_provider();
    HttpServer::new(config, registry).unwrap().router()
}
