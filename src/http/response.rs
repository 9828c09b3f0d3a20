//! Override responder.
//!
//! # Responsibilities
//! - Turn a registered override into the response sent to the client
//!
//! # Design Decisions
//! - Headers first, then status, then body: the status is final before any
//!   byte of the body exists, so it can never silently fall back to 200
//! - The body is a refcounted `Bytes`; serving it does not copy the payload

use axum::body::Body;
use axum::http::Response;

use crate::routing::ResponseOverride;

/// Build the client response for an override.
pub fn override_response(canned: &ResponseOverride) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    response.headers_mut().clone_from(canned.headers());
    *response.status_mut() = canned.status();
    *response.body_mut() = Body::from(canned.body().clone());
    response
}
