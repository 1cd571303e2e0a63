//! Admission control and upstream dispatch.
//!
//! # Responsibilities
//! - Refuse traffic outright when the node pool is empty, before any
//!   network call is attempted
//! - Otherwise direct the request and forward it to the chosen node
//! - Surface upstream failures on the response path without retrying

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::observability::metrics;
use crate::proxy::director::Director;
use crate::registry::Registry;

/// Wraps the outbound HTTP client with the admission gate.
pub struct AdmissionGate {
    registry: Arc<Registry>,
    director: Director,
    client: Client<HttpConnector, Body>,
}

impl AdmissionGate {
    pub fn new(registry: Arc<Registry>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            director: Director::new(registry.clone()),
            registry,
            client,
        }
    }

    /// Route one request: gate, direct, forward.
    pub async fn dispatch(&self, mut request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();

        if !self.registry.has_nodes() {
            tracing::debug!(method = %method, "node pool empty, refusing request");
            metrics::record_request(&method, 503, "none", start);
            return unavailable();
        }

        let Some(target) = self.director.direct(&mut request) else {
            // The registered count can briefly run ahead of a freshly
            // swapped resolver; an empty pick is still a refusal.
            metrics::record_request(&method, 503, "none", start);
            return unavailable();
        };

        match self.client.request(request).await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(
                    method = %method,
                    target = %target,
                    status = status.as_u16(),
                    "request proxied"
                );
                metrics::record_request(&method, status.as_u16(), target.as_str(), start);

                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(method = %method, target = %target, error = %e, "upstream request failed");
                metrics::record_request(&method, 502, target.as_str(), start);
                (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
            }
        }
    }
}

/// Synthetic empty-body 503, produced locally with no backend involved.
fn unavailable() -> Response {
    Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .body(Body::empty())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AvailabilityPolicy, NodeStatus};

    #[tokio::test]
    async fn empty_pool_short_circuits_with_empty_503() {
        let registry = Arc::new(Registry::new(AvailabilityPolicy::default()));
        let gate = AdmissionGate::new(registry);
        let request = Request::builder().uri("/ping").body(Body::empty()).unwrap();

        let response = gate.dispatch(request).await;

        // No backend exists anywhere; a 503 (not a 502 connect error)
        // proves the wrapped client was never invoked.
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn upstream_connect_failure_surfaces_as_502() {
        let registry = Arc::new(Registry::new(AvailabilityPolicy::default()));
        // Port 9 (discard) on localhost: nothing is listening there.
        registry.ingest(NodeStatus {
            id: "n1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9,
            max_connections: 100,
            active_connections: 0,
        });
        let gate = AdmissionGate::new(registry);
        let request = Request::builder().uri("/ping").body(Body::empty()).unwrap();

        let response = gate.dispatch(request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
