//! # Asset-Vault Node
//!
//! Entry point: logging, configuration, signals.
//!
//! ## Startup Sequence
//!
//! 1. Install the `tracing` subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration from `AV_*` environment variables
//! 3. Open the asset store and provision `AV_USERS`
//! 4. Serve on `AV_HTTP_HOST:AV_HTTP_PORT` until SIGINT or SIGTERM

use anyhow::Result;
use node_runtime::container::NodeConfig;
use node_runtime::NodeRuntime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = NodeConfig::from_env()?;

    let runtime = NodeRuntime::start(config).await?;
    info!("Press Ctrl+C to stop.");
    runtime.run_until(shutdown_signal()).await
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
