//! Routing subsystem: the override-or-forward decision.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → matcher.rs (normalize into "path?query" key)
//!     → router.rs (registry lookup)
//!     → registry.rs (first entry whose key prefixes the request key)
//!     → Return: Override(entry) or Forward
//!
//! Registry construction (at startup):
//!     OverrideConfig[]
//!     → read payloads, normalize patterns
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Overrides compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: registration order decides between overlapping keys
//! - First match wins, not longest match

pub mod matcher;
pub mod registry;
pub mod router;

pub use matcher::{normalize_key, request_key, ResponseMatcher};
pub use registry::{OverrideEntry, OverrideRegistry, ResponseOverride};
pub use router::{RouteDecision, Router};
