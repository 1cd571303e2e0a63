//! Simulated backend fleet.
//!
//! Spawns a set of HTTP servers on consecutive ports. Each answers any
//! request after a synthetic 0–24ms delay, holding the delay amount in
//! its reported active-connection count for the duration, and reports
//! its status to the balancer's control channel every tick. A periodic
//! "killer" silences one random node's heartbeats long enough for the
//! balancer to evict it, then lets it resume.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::any, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::time::{self, MissedTickBehavior};
use uuid::Uuid;

use node_balancer::lifecycle::{signals, Shutdown};
use node_balancer::observability;
use node_balancer::registry::NodeStatus;

#[derive(Parser)]
#[command(name = "node-agent")]
#[command(about = "Simulated backend node fleet", long_about = None)]
struct Args {
    /// Base URL of the balancer's control channel.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    balancer: String,

    /// Number of backend servers to simulate.
    #[arg(long, default_value_t = 10)]
    servers: u16,

    /// First HTTP port; servers bind consecutive ports from here.
    #[arg(long, default_value_t = 9000)]
    base_port: u16,

    /// Declared per-node connection capacity.
    #[arg(long, default_value_t = 100)]
    max_connections: u32,

    /// Heartbeat period in milliseconds.
    #[arg(long, default_value_t = 10)]
    heartbeat_ms: u64,

    /// Period of the random killer; 0 disables it.
    #[arg(long, default_value_t = 30)]
    killer_secs: u64,
}

/// Heartbeat ticks a killed node stays silent before resuming.
const SILENCED_TICKS: u32 = 100;

/// One simulated backend: a stable identity plus a synthetic load counter.
struct BackendNode {
    id: String,
    ip: String,
    port: u16,
    max_connections: u32,
    load: AtomicU32,
}

impl BackendNode {
    fn new(port: u16, max_connections: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ip: "127.0.0.1".to_string(),
            port,
            max_connections,
            load: AtomicU32::new(0),
        }
    }

    fn status(&self) -> NodeStatus {
        NodeStatus {
            id: self.id.clone(),
            ip: self.ip.clone(),
            port: u32::from(self.port),
            max_connections: self.max_connections,
            active_connections: self.load.load(Ordering::Relaxed),
        }
    }
}

/// Holds synthetic load for the lifetime of one request.
struct LoadGuard {
    node: Arc<BackendNode>,
    amount: u32,
}

impl LoadGuard {
    fn take(node: Arc<BackendNode>, amount: u32) -> Self {
        node.load.fetch_add(amount, Ordering::Relaxed);
        Self { node, amount }
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.node.load.fetch_sub(self.amount, Ordering::Relaxed);
    }
}

/// Reply to anything after a random delay; the delay amount doubles as
/// the load the node reports while it sleeps.
async fn handle(State(node): State<Arc<BackendNode>>) -> String {
    let delay = fastrand::u32(..25);
    let _guard = LoadGuard::take(node.clone(), delay);
    tokio::time::sleep(Duration::from_millis(u64::from(delay))).await;
    format!("pong from {}", node.id)
}

/// One heartbeat. A failed send is logged and naturally retried on the
/// next tick; sustained failure gets the node evicted by the balancer's
/// staleness bound, which is the intended liveness mechanism.
async fn send_status(client: &reqwest::Client, balancer: &str, status: &NodeStatus) {
    let result = client
        .post(format!("{balancer}/v1/status"))
        .timeout(Duration::from_secs(1))
        .json(status)
        .send()
        .await;

    match result {
        Ok(response) if !response.status().is_success() => {
            tracing::warn!(
                port = status.port,
                status = response.status().as_u16(),
                "balancer rejected heartbeat"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(port = status.port, error = %e, "heartbeat not delivered, retrying next tick");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init("info");

    let args = Args::parse();
    let shutdown = Shutdown::new();

    tracing::info!(servers = args.servers, base_port = args.base_port, "starting backend fleet");

    let mut nodes: Vec<Arc<BackendNode>> = Vec::with_capacity(usize::from(args.servers));
    let mut server_tasks = Vec::with_capacity(usize::from(args.servers));

    for i in 0..args.servers {
        let port = args.base_port + i;
        let node = Arc::new(BackendNode::new(port, args.max_connections));

        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let app = Router::new()
            .route("/", any(handle))
            .route("/{*path}", any(handle))
            .with_state(node.clone());

        let mut rx = shutdown.subscribe();
        server_tasks.push(tokio::spawn(async move {
            tracing::info!(port, "node http server starting");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                })
                .await
            {
                tracing::error!(port, error = %e, "node http server error");
            }
        }));

        nodes.push(node);
    }

    let client = reqwest::Client::new();

    // Register the whole fleet before the first tick.
    for node in &nodes {
        send_status(&client, &args.balancer, &node.status()).await;
    }

    let mut heartbeat = time::interval(Duration::from_millis(args.heartbeat_ms));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let killer_period = Duration::from_secs(args.killer_secs.max(1));
    let mut killer = time::interval_at(time::Instant::now() + killer_period, killer_period);

    // Index of the node currently withholding heartbeats, if any.
    let mut silenced: Option<usize> = None;
    let mut silenced_ticks_left: u32 = 0;

    let shutdown_signal = signals::wait_for_shutdown();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => break,
            _ = heartbeat.tick() => {
                for (i, node) in nodes.iter().enumerate() {
                    if silenced == Some(i) {
                        silenced_ticks_left = silenced_ticks_left.saturating_sub(1);
                        if silenced_ticks_left == 0 {
                            tracing::info!(port = node.port, "killer: node resumes heartbeats");
                            silenced = None;
                        }
                        continue;
                    }
                    send_status(&client, &args.balancer, &node.status()).await;
                }
            }
            _ = killer.tick(), if args.killer_secs > 0 => {
                if silenced.is_none() {
                    let i = fastrand::usize(..nodes.len());
                    tracing::info!(port = nodes[i].port, "killer: node stops sending heartbeats");
                    silenced = Some(i);
                    silenced_ticks_left = SILENCED_TICKS;
                }
            }
        }
    }

    shutdown.trigger();
    let drain = async {
        for task in server_tasks {
            let _ = task.await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), drain).await.is_err() {
        tracing::warn!("grace period elapsed, abandoning node servers");
    }

    Ok(())
}
