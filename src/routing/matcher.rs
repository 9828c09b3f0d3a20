//! Override matching logic.
//!
//! # Responsibilities
//! - Normalize a URL-like value into a `path?query` key
//! - Hold a pattern together with its precomputed key
//! - Test a request key against a pattern key (plain string prefix)
//!
//! # Design Decisions
//! - Scheme, host and fragment never take part in matching
//! - The query is re-encoded, so `%41` and `A` compare equal, but
//!   parameter order is kept as sent
//! - Prefix test is byte-wise, not segment-aware: `/api` matches `/apix`
//! - Keys are computed once when a matcher is built
//! - Request keys never go through URL resolution, so the key always
//!   describes the path that is forwarded upstream

use std::fmt;
use std::hash::{Hash, Hasher};

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

/// Compute the normalized `path?query` key of a matcher pattern.
///
/// Accepts absolute URLs (`https://host/path?q`) as well as origin-form
/// patterns (`/path?q`). The path is percent-decoded; the query is parsed as
/// form pairs and serialized again.
pub fn normalize_key(raw: &str) -> Result<String, url::ParseError> {
    if raw.starts_with('/') {
        let target = raw.split_once('#').map_or(raw, |(target, _)| target);
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        return Ok(join_key(path, query));
    }

    let url = Url::parse(raw)?;
    Ok(join_key(url.path(), url.query()))
}

fn join_key(path: &str, query: Option<&str>) -> String {
    let path = percent_decode_str(path).decode_utf8_lossy();
    let query = query.map(reencode_query).unwrap_or_default();
    format!("{path}?{query}")
}

fn reencode_query(query: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_urlencoded::parse(query.as_bytes()))
        .finish()
}

/// Normalized key of an inbound request target.
///
/// Built from the raw request path: no dot-segment removal, and a leading
/// `//` stays part of the path.
pub fn request_key(uri: &Uri) -> String {
    join_key(uri.path(), uri.query())
}

/// Identifies which requests an override applies to.
///
/// Two matchers are equal when their patterns are equal.
#[derive(Clone)]
pub struct ResponseMatcher {
    pattern: String,
    key: Result<String, url::ParseError>,
}

impl ResponseMatcher {
    /// Create a matcher, normalizing its pattern up front.
    ///
    /// A pattern that does not parse still produces a matcher; it simply
    /// never matches anything.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let key = normalize_key(&pattern);
        if let Err(e) = &key {
            tracing::warn!(pattern = %pattern, error = %e, "Override pattern does not parse; it will be skipped");
        }
        Self { pattern, key }
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The normalized key, if the pattern parsed.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().ok()
    }

    /// Why the pattern could not be parsed.
    pub fn parse_error(&self) -> Option<url::ParseError> {
        self.key.as_ref().err().copied()
    }

    /// Returns true if `request_key` starts with this matcher's key.
    pub fn matches(&self, request_key: &str) -> bool {
        match &self.key {
            Ok(key) => request_key.starts_with(key.as_str()),
            Err(_) => false,
        }
    }
}

impl PartialEq for ResponseMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ResponseMatcher {}

impl Hash for ResponseMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

impl fmt::Debug for ResponseMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseMatcher")
            .field("pattern", &self.pattern)
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_form_key() {
        assert_eq!(normalize_key("/api/data?id=1").unwrap(), "/api/data?id=1");
        assert_eq!(normalize_key("/api/other").unwrap(), "/api/other?");
        assert_eq!(normalize_key("/").unwrap(), "/?");
    }

    #[test]
    fn test_scheme_host_and_fragment_ignored() {
        assert_eq!(
            normalize_key("https://www.example.com/api/data?id=1#frag").unwrap(),
            "/api/data?id=1"
        );
        assert_eq!(
            normalize_key("http://other.test:8080/api/data?id=1").unwrap(),
            normalize_key("/api/data?id=1").unwrap()
        );
    }

    #[test]
    fn test_query_reencoded() {
        // Percent-encoding is canonicalized, ordering is kept.
        assert_eq!(normalize_key("/q?name=%41b").unwrap(), "/q?name=Ab");
        assert_eq!(normalize_key("/q?a=b%20c").unwrap(), "/q?a=b+c");
        assert_eq!(normalize_key("/q?a=b+c").unwrap(), "/q?a=b+c");
        assert_eq!(normalize_key("/q?z=1&a=2").unwrap(), "/q?z=1&a=2");
        assert_eq!(
            normalize_key("/q?v=(urn:li:x,type:skills").unwrap(),
            "/q?v=%28urn%3Ali%3Ax%2Ctype%3Askills"
        );
        // Bare keys gain an `=`, empty pairs disappear.
        assert_eq!(normalize_key("/q?flag&&b=2").unwrap(), "/q?flag=&b=2");
    }

    #[test]
    fn test_path_decoded() {
        assert_eq!(normalize_key("/a%20b").unwrap(), "/a b?");
        assert_eq!(normalize_key("/a%20b").unwrap(), normalize_key("/a b").unwrap());
    }

    #[test]
    fn test_prefix_match_with_extra_query() {
        let matcher = ResponseMatcher::new("/api/data?id=1");
        let key = normalize_key("/api/data?id=1&extra=2").unwrap();
        assert_eq!(key, "/api/data?id=1&extra=2");
        assert!(matcher.matches(&key));

        assert!(!matcher.matches(&normalize_key("/api/other").unwrap()));
        assert!(!matcher.matches(&normalize_key("/api/data?id=2").unwrap()));
    }

    #[test]
    fn test_path_only_pattern_matches_any_query() {
        let matcher = ResponseMatcher::new("/api");
        assert!(matcher.matches(&normalize_key("/api").unwrap()));
        assert!(matcher.matches(&normalize_key("/api?x=1").unwrap()));
        // The `?` separator pins the path exactly.
        assert!(!matcher.matches(&normalize_key("/apix").unwrap()));
        assert!(!matcher.matches(&normalize_key("/api/v1").unwrap()));
    }

    #[test]
    fn test_query_prefix_is_not_pair_aware() {
        let matcher = ResponseMatcher::new("/api/data?id=1");
        assert!(matcher.matches(&normalize_key("/api/data?id=12").unwrap()));
        assert!(matcher.matches(&normalize_key("/api/data?id=1x=2").unwrap()));
    }

    #[test]
    fn test_case_sensitive() {
        let matcher = ResponseMatcher::new("/API/data");
        assert!(!matcher.matches(&normalize_key("/api/data").unwrap()));
    }

    #[test]
    fn test_malformed_pattern_never_matches() {
        let matcher = ResponseMatcher::new("http://[::1/api");
        assert!(matcher.key().is_none());
        assert!(matcher.parse_error().is_some());
        assert!(!matcher.matches("/api?"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_equality_by_pattern() {
        assert_eq!(ResponseMatcher::new("/a?x=1"), ResponseMatcher::new("/a?x=1"));
        assert_ne!(ResponseMatcher::new("/a?x=1"), ResponseMatcher::new("/a?x=%31"));
    }

    #[test]
    fn test_request_key_from_uri() {
        let uri: Uri = "/api/data?id=1&extra=2".parse().unwrap();
        assert_eq!(request_key(&uri), "/api/data?id=1&extra=2");

        let absolute: Uri = "https://www.example.com/api/data".parse().unwrap();
        assert_eq!(request_key(&absolute), "/api/data?");

        let encoded: Uri = "/q?a=b%20c&z=%41".parse().unwrap();
        assert_eq!(request_key(&encoded), "/q?a=b+c&z=A");
    }

    #[test]
    fn test_request_key_keeps_raw_path() {
        let cases = [
            ("//x/api/data?id=1", "//x/api/data?id=1"),
            ("/x/../api/data?id=1", "/x/../api/data?id=1"),
            ("/x/%2e%2e/api/data?id=1", "/x/../api/data?id=1"),
            ("/./api/data?id=1", "/./api/data?id=1"),
        ];
        let matcher = ResponseMatcher::new("/api/data?id=1");
        for (target, expected) in cases {
            let key = request_key(&target.parse().unwrap());
            assert_eq!(key, expected);
            assert!(!matcher.matches(&key), "{target} must not match");
        }
    }

    #[test]
    fn test_origin_pattern_drops_fragment() {
        assert_eq!(normalize_key("/api/data?id=1#top").unwrap(), "/api/data?id=1");
        assert_eq!(normalize_key("/api#top").unwrap(), "/api?");
    }
}
