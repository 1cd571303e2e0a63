//! Heartbeat-driven HTTP load balancer.
//!
//! Runs three long-lived tasks over one shared registry: the control
//! server ingesting node heartbeats, the reconciler evicting stale and
//! overloaded nodes every few milliseconds, and the reverse proxy
//! dispatching client traffic across whatever is currently routable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use node_balancer::config::{load_config, BalancerConfig};
use node_balancer::control::ControlServer;
use node_balancer::lifecycle::{signals, Shutdown};
use node_balancer::observability;
use node_balancer::proxy::ProxyServer;
use node_balancer::registry::{AvailabilityPolicy, Reconciler, Registry};

#[derive(Parser)]
#[command(name = "node-balancer")]
#[command(about = "Heartbeat-driven HTTP load balancer", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };

    observability::logging::init(&config.observability.log_level);

    tracing::info!(
        proxy_address = %config.proxy.bind_address,
        control_address = %config.control.bind_address,
        reconcile_interval_ms = config.registry.reconcile_interval_ms,
        staleness_ms = config.registry.staleness_ms,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(Registry::new(AvailabilityPolicy::new(
        Duration::from_millis(config.registry.staleness_ms),
    )));
    let shutdown = Shutdown::new();

    // Reconciler: the only task that evicts nodes.
    let reconciler = Reconciler::new(
        registry.clone(),
        Duration::from_millis(config.registry.reconcile_interval_ms),
    );
    let reconciler_task = tokio::spawn(reconciler.run(shutdown.subscribe()));

    // Control channel: node heartbeats.
    let control_listener = TcpListener::bind(&config.control.bind_address).await?;
    let control = ControlServer::new(registry.clone());
    let control_shutdown = shutdown.subscribe();
    let control_task = tokio::spawn(async move {
        if let Err(e) = control.run(control_listener, control_shutdown).await {
            tracing::error!(error = %e, "control server error");
        }
    });

    // Data channel: the reverse proxy.
    let proxy_listener = TcpListener::bind(&config.proxy.bind_address).await?;
    let proxy = ProxyServer::new(registry.clone(), &config.timeouts);
    let proxy_shutdown = shutdown.subscribe();
    let proxy_task = tokio::spawn(async move {
        if let Err(e) = proxy.run(proxy_listener, proxy_shutdown).await {
            tracing::error!(error = %e, "proxy server error");
        }
    });

    signals::wait_for_shutdown().await;
    shutdown.trigger();

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let drain = async {
        let _ = proxy_task.await;
        let _ = control_task.await;
        let _ = reconciler_task.await;
    };
    match tokio::time::timeout(grace, drain).await {
        Ok(()) => tracing::info!("shutdown complete"),
        Err(_) => tracing::warn!(
            grace_secs = config.timeouts.shutdown_grace_secs,
            "grace period elapsed, abandoning remaining tasks"
        ),
    }

    Ok(())
}
