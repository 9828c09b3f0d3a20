//! override-proxy
//!
//! An HTTPS reverse proxy that answers selected requests with canned
//! responses and forwards everything else to a fixed upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                OVERRIDE PROXY                │
//!                      │                                              │
//!   Client Request     │  ┌─────────┐    ┌─────────┐    ┌──────────┐  │
//!   ───────────────────┼─▶│  net    │───▶│  http   │───▶│ routing  │  │
//!                      │  │  tls    │    │ server  │    │ registry │  │
//!                      │  └─────────┘    └─────────┘    └────┬─────┘  │
//!                      │                                     │        │
//!                      │                     match ┌─────────┴──┐     │
//!                      │                           ▼            ▼     │
//!   Client Response    │                  ┌──────────┐  ┌───────────┐ │
//!   ◀──────────────────┼──────────────────│ override │  │ forwarder │─┼──▶ Upstream
//!                      │                  │ response │  │ Host →    │ │
//!                      │                  └──────────┘  └───────────┘ │
//!                      │                                              │
//!                      │   config · lifecycle · observability         │
//!                      └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```text
//! override-proxy [LISTEN_ADDR] [PROXY_HOST] [UPSTREAM] [--config FILE]
//!                [--override PATTERN=BODY_FILE]...
//! ```

use std::path::PathBuf;

use clap::Parser;

use override_proxy::config::{load_config, OverrideConfig, ProxyConfig};
use override_proxy::lifecycle::startup;
use override_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "override-proxy")]
#[command(about = "HTTPS reverse proxy that pins selected responses", long_about = None)]
struct Cli {
    /// Address to listen on (default 0.0.0.0:8443)
    listen_addr: Option<String>,

    /// Host header presented to the upstream (default www.linkedin.com)
    proxy_host: Option<String>,

    /// Upstream address actually dialed (default 13.107.42.14)
    upstream: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener certificate (PEM)
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Listener private key (PEM)
    #[arg(long)]
    key: Option<PathBuf>,

    /// Accept any upstream certificate (true/false)
    #[arg(long)]
    insecure_upstream: Option<bool>,

    /// Extra override served with status 200 as application/json
    #[arg(short = 'o', long = "override", value_name = "PATTERN=BODY_FILE")]
    overrides: Vec<OverrideConfig>,
}

impl Cli {
    /// Command line values win over the file.
    fn apply(self, config: &mut ProxyConfig) {
        if let Some(addr) = self.listen_addr {
            config.listener.bind_address = addr;
        }
        if let Some(host) = self.proxy_host {
            config.upstream.host = host;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.address = upstream;
        }
        if let Some(cert) = self.cert {
            config.listener.tls.cert_path = cert;
        }
        if let Some(key) = self.key {
            config.listener.tls.key_path = key;
        }
        if let Some(insecure) = self.insecure_upstream {
            config.upstream.skip_certificate_verification = insecure;
        }
        config.overrides.extend(self.overrides);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    logging::init(&config.observability);

    tracing::info!("override-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        upstream_host = %config.upstream.host,
        skip_certificate_verification = config.upstream.skip_certificate_verification,
        overrides = config.overrides.len(),
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
