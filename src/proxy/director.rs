//! Destination rewriting for proxied requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use axum::http::Request;

use crate::registry::Registry;

/// Rewrites each inbound request's destination to the resolver's
/// current pick. Method, headers, body, path, and query are left
/// untouched.
pub struct Director {
    registry: Arc<Registry>,
}

impl Director {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Select a target and point the request at it. Returns the chosen
    /// authority, or `None` when the routable set is empty.
    pub fn direct(&self, request: &mut Request<Body>) -> Option<Authority> {
        let target = self.registry.next()?;

        let original = request.uri().clone();
        let mut parts = original.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(target.clone());
        // Server-side URIs arrive in origin form; an absent path only
        // happens for CONNECT-style requests.
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }

        *request.uri_mut() = Uri::from_parts(parts).unwrap_or(original);
        Some(target)
    }
}
