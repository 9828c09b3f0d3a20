//! HTTPS reverse proxy that pins selected responses.
//!
//! Requests whose path and query start with a registered pattern get a
//! canned response; everything else is forwarded to one fixed upstream with
//! the Host header rewritten.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{OverrideRegistry, ResponseMatcher, ResponseOverride};
