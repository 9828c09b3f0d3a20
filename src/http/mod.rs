//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → [routing layer decides override vs forward]
//!     → response.rs (canned response)      ─┐
//!     → forwarder.rs + headers.rs (upstream) ├→ Send to client
//! ```

pub mod forwarder;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardError, Forwarder};
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
