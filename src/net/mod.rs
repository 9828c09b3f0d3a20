//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum-server (accept loop, one task per connection)
//!     → tls.rs (listener certificate, rustls handshake)
//!     → Hand off to HTTP layer
//!
//! Outgoing upstream connection
//!     → tls.rs (client config, optional verification bypass)
//!     → http::forwarder
//! ```
//!
//! # Design Decisions
//! - TLS is mandatory on the listener
//! - Certificate problems are fatal at startup, never per request

pub mod tls;
