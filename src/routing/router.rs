//! Per-request routing decision.
//!
//! # Responsibilities
//! - Look a normalized request key up in the frozen override registry
//! - Return an explicit Override or Forward decision
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Pure function of the request target: same input, same decision
//! - Explicit Forward rather than a silent default

use crate::routing::registry::{OverrideEntry, OverrideRegistry};

/// What to do with a request.
#[derive(Debug, Clone, Copy)]
pub enum RouteDecision<'a> {
    /// Serve this canned response; do not contact the upstream.
    Override(&'a OverrideEntry),
    /// Hand the request to the forwarder.
    Forward,
}

impl RouteDecision<'_> {
    pub fn is_override(&self) -> bool {
        matches!(self, RouteDecision::Override(_))
    }

    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouteDecision::Override(_) => "override",
            RouteDecision::Forward => "forward",
        }
    }
}

/// Routes requests against a frozen set of overrides.
#[derive(Debug, Default)]
pub struct Router {
    registry: OverrideRegistry,
}

impl Router {
    pub fn new(registry: OverrideRegistry) -> Self {
        Self { registry }
    }

    /// Decide for an already normalized request key.
    pub fn route(&self, key: &str) -> RouteDecision<'_> {
        match self.registry.find(key) {
            Some(entry) => RouteDecision::Override(entry),
            None => RouteDecision::Forward,
        }
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }
}
