//! HTTP server for the data channel.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::TimeoutConfig;
use crate::proxy::admission::AdmissionGate;
use crate::registry::Registry;

/// Application state injected into the proxy handler.
#[derive(Clone)]
struct AppState {
    gate: Arc<AdmissionGate>,
}

/// Reverse-proxy server: any method, any path.
pub struct ProxyServer {
    router: Router,
}

impl ProxyServer {
    pub fn new(registry: Arc<Registry>, timeouts: &TimeoutConfig) -> Self {
        let state = AppState {
            gate: Arc::new(AdmissionGate::new(registry)),
        };

        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs))),
            );

        Self { router }
    }

    /// Serve until the shutdown signal fires; in-flight requests are
    /// drained by axum's graceful shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "proxy server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("proxy server stopped");
        Ok(())
    }
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.gate.dispatch(request).await
}
