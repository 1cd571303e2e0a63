//! HTTP server for the control channel.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::registry::{NodeSnapshot, NodeStatus, Registry};

/// Control-channel server: receives node heartbeats and exposes a
/// read-only view of the registry.
pub struct ControlServer {
    registry: Arc<Registry>,
}

impl ControlServer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/status", post(set_status))
            .route("/v1/nodes", get(list_nodes))
            .route("/v1/health", get(health))
            .with_state(self.registry.clone())
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "control server starting");

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("control server stopped");
        Ok(())
    }
}

/// Heartbeat ingestion: replace the node's health record and
/// acknowledge with an empty success response.
async fn set_status(
    State(registry): State<Arc<Registry>>,
    Json(status): Json<NodeStatus>,
) -> StatusCode {
    tracing::debug!(
        id = %status.id,
        ip = %status.ip,
        port = status.port,
        active = status.active_connections,
        "heartbeat received"
    );
    registry.ingest(status);
    metrics::record_heartbeat();
    StatusCode::NO_CONTENT
}

/// Read-only snapshot of the registry's current records.
async fn list_nodes(State(registry): State<Arc<Registry>>) -> Json<Vec<NodeSnapshot>> {
    Json(registry.snapshot())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AvailabilityPolicy;

    #[tokio::test]
    async fn heartbeat_is_acknowledged_and_recorded() {
        let registry = Arc::new(Registry::new(AvailabilityPolicy::default()));
        let status = NodeStatus {
            id: "n1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9000,
            max_connections: 100,
            active_connections: 0,
        };

        let code = set_status(State(registry.clone()), Json(status)).await;

        assert_eq!(code, StatusCode::NO_CONTENT);
        assert!(registry.has_nodes());
    }

    #[tokio::test]
    async fn node_listing_reflects_registry() {
        let registry = Arc::new(Registry::new(AvailabilityPolicy::default()));
        registry.ingest(NodeStatus {
            id: "n1".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 9000,
            max_connections: 100,
            active_connections: 2,
        });

        let Json(nodes) = list_nodes(State(registry)).await;
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].address, "127.0.0.1:9000");
    }
}
