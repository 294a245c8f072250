//! # sparkyservice
//!
//! Main entry point for the sparkyservice server.

#![forbid(unsafe_code)]

use sparky_core::Config;
use sparky_server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        memory_users = config.identity.memory_users.len(),
        cross_realm_fallback = config.identity.cross_realm_fallback,
        "sparkyservice starting..."
    );

    Server::new(config)?.run().await
}
