//! # Node Runtime Library
//!
//! Wires the asset store to the HTTP server and owns the process lifecycle.
//! The `main.rs` binary adds logging and signal handling on top.
//!
//! ## Shutdown Sequence
//!
//! 1. Shutdown signal flips the watch channel
//! 2. HTTP listener stops accepting, in-flight requests drain (bounded)
//! 3. Background token purge stops
//! 4. Gateway closes, after nothing can reach it any more

pub mod container;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use av_01_asset_store::AssetGateway;
use av_02_api_gateway::ApiServer;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::container::{GatewayContainer, NodeConfig, TokenMaintenance};

/// A started node: HTTP server and purge task running.
pub struct NodeRuntime {
    gateway: Arc<dyn AssetGateway>,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<Result<(), av_02_api_gateway::GatewayError>>,
    purge: JoinHandle<()>,
}

impl NodeRuntime {
    /// Open storage, bind the listener and start serving.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        info!("===========================================");
        info!("  Asset-Vault Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let container = GatewayContainer::open(&config)
            .await
            .context("Failed to open asset store")?;

        let server = ApiServer::bind(config.api_config(), Arc::clone(&container.gateway))
            .await
            .context("Failed to bind HTTP listener")?;
        let local_addr = server.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let purge = tokio::spawn(purge_loop(
            Arc::clone(&container.maintenance),
            config.tokens.purge_interval,
            shutdown_rx.clone(),
        ));
        let server = tokio::spawn(server.run(shutdown_rx));

        info!(addr = %local_addr, backend = ?config.storage.backend, "Node is running");

        Ok(Self {
            gateway: container.gateway,
            local_addr,
            shutdown_tx,
            server,
            purge,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn gateway(&self) -> Arc<dyn AssetGateway> {
        Arc::clone(&self.gateway)
    }

    /// Serve until `signal` resolves (or the server exits), then shut down.
    pub async fn run_until<F>(mut self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let exited = tokio::select! {
            _ = signal => None,
            result = &mut self.server => Some(result),
        };

        let Some(result) = exited else {
            return self.shutdown().await;
        };

        // Server exited on its own; still close the gateway cleanly.
        warn!("HTTP server exited before shutdown was requested");
        let _ = self.shutdown_tx.send(true);
        let _ = self.purge.await;
        self.gateway.close().await?;
        result
            .context("HTTP server task failed")?
            .context("HTTP server failed")
    }

    /// Ordered shutdown: listener and requests first, gateway last.
    pub async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        let served = self.server.await.context("HTTP server task failed")?;
        if let Err(e) = &served {
            error!(error = %e, "HTTP server stopped with error");
        }
        if let Err(e) = self.purge.await {
            warn!(error = %e, "Token purge task ended abnormally");
        }

        info!("Shutting down database connection");
        self.gateway.close().await.context("Failed to close asset store")?;

        info!("Shutdown complete");
        served.context("HTTP server failed")
    }
}

/// Remove expired tokens every `interval` until shutdown.
async fn purge_loop(
    maintenance: Arc<dyn TokenMaintenance>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match maintenance.purge_expired_tokens().await {
                    Ok(purged) => debug!(purged, "Token purge pass complete"),
                    Err(e) => error!(error = %e, "Token purge failed"),
                }
            }
            _ = shutdown.changed() => {
                debug!("Token purge stopping");
                return;
            }
        }
    }
}
