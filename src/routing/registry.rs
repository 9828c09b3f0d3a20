//! Override registry.
//!
//! # Responsibilities
//! - Store (matcher, canned response) pairs in registration order
//! - Replace an entry when its pattern is registered again
//! - Find the first entry whose key prefixes a request key
//!
//! # Design Decisions
//! - Ordered `Vec`, not a map: first-match-wins must not depend on hash order
//! - Populated at startup, then frozen behind an `Arc` (no locks)
//! - O(n) scan; override lists are short

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;

use crate::routing::matcher::ResponseMatcher;

/// A canned response served in place of the upstream's.
#[derive(Debug, Clone)]
pub struct ResponseOverride {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseOverride {
    /// Create an override with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Append a header value; repeated names keep every value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// One registered override.
#[derive(Debug, Clone)]
pub struct OverrideEntry {
    matcher: ResponseMatcher,
    response: ResponseOverride,
}

impl OverrideEntry {
    pub fn matcher(&self) -> &ResponseMatcher {
        &self.matcher
    }

    pub fn response(&self) -> &ResponseOverride {
        &self.response
    }
}

/// Ordered set of overrides, searched first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct OverrideRegistry {
    entries: Vec<OverrideEntry>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override, or replace the one registered under the same pattern.
    ///
    /// A replaced entry keeps its place in the match order.
    pub fn register(&mut self, matcher: ResponseMatcher, response: ResponseOverride) {
        match self.entries.iter_mut().find(|e| e.matcher == matcher) {
            Some(existing) => {
                tracing::debug!(pattern = %matcher.pattern(), "Replacing override");
                existing.response = response;
            }
            None => self.entries.push(OverrideEntry { matcher, response }),
        }
    }

    /// First entry, in registration order, whose key prefixes `request_key`.
    pub fn find(&self, request_key: &str) -> Option<&OverrideEntry> {
        self.entries.iter().find(|entry| {
            if let Some(e) = entry.matcher.parse_error() {
                tracing::trace!(pattern = %entry.matcher.pattern(), error = %e, "Skipping unparseable override");
                return false;
            }
            entry.matcher.matches(request_key)
        })
    }

    /// The override applying to `request_key`, if any.
    pub fn lookup(&self, request_key: &str) -> Option<&ResponseOverride> {
        self.find(request_key).map(OverrideEntry::response)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverrideEntry> {
        self.entries.iter()
    }
}
