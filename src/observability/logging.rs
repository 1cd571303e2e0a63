//! Structured logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_level` applies, with
/// hyper's connection chatter capped at warn.
pub fn init(fallback_level: &str) {
    let fallback = format!("{fallback_level},hyper=warn,hyper_util=warn");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
