//! API server lifecycle.
//!
//! Shutdown runs in phases:
//!
//! 1. Stop accepting connections when the shutdown channel flips to `true`.
//! 2. Let in-flight requests finish, up to `shutdown_grace`.
//! 3. Cut off whatever is still running, and every request that arrives
//!    later on a lingering connection.
//!
//! [`ApiServer::run`] returns only after every request has left the router
//! and no new one can enter it, so the caller can close the gateway without
//! a request observing it.

use crate::domain::config::ApiConfig;
use crate::domain::error::GatewayError;
use crate::handlers::AppState;
use crate::middleware::InFlight;
use crate::router::build_router;
use av_01_asset_store::AssetGateway;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// How long the accept loop gets to wind down once requests have drained.
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// A bound, not yet serving, HTTP server.
pub struct ApiServer {
    config: ApiConfig,
    listener: TcpListener,
    state: AppState,
    in_flight: Arc<InFlight>,
}

impl ApiServer {
    /// Validate the config and bind the listener.
    pub async fn bind(
        config: ApiConfig,
        gateway: Arc<dyn AssetGateway>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let listener = TcpListener::bind(config.addr())
            .await
            .map_err(GatewayError::Bind)?;
        let state = AppState::new(gateway, config.max_upload_size);

        Ok(Self {
            config,
            listener,
            state,
            in_flight: InFlight::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, GatewayError> {
        self.listener.local_addr().map_err(GatewayError::Bind)
    }

    /// Serve until `shutdown` becomes `true`, then drain.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), GatewayError> {
        let addr = self.local_addr()?;
        let Self {
            config,
            listener,
            state,
            in_flight,
        } = self;
        let grace = config.shutdown_grace;

        let app = build_router(state, &config, Arc::clone(&in_flight))
            .into_make_service_with_connect_info::<SocketAddr>();

        info!(addr = %addr, "Listening");

        let stop = shutdown.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(wait_for_shutdown(stop))
                .await
        });

        tokio::select! {
            result = &mut server => {
                // Exited before shutdown was requested.
                return flatten(result);
            }
            _ = wait_for_shutdown(shutdown) => {}
        }

        info!(in_flight = in_flight.active(), "Shutting down web server");

        if tokio::time::timeout(grace, in_flight.wait_idle()).await.is_err() {
            warn!(
                in_flight = in_flight.active(),
                grace_secs = grace.as_secs(),
                "Grace period elapsed, cutting off remaining requests"
            );
        }
        // Connection tasks can outlive the accept loop. Whatever they still
        // deliver from here on is answered with a 503 before the router.
        in_flight.cut_off();
        in_flight.wait_idle().await;

        match tokio::time::timeout(SERVER_STOP_TIMEOUT, &mut server).await {
            Ok(result) => flatten(result)?,
            Err(_) => {
                server.abort();
                warn!("Closing idle connections forcibly");
            }
        }

        info!("Web server stopped");
        Ok(())
    }
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // A dropped sender counts as a shutdown request.
    let _ = rx.wait_for(|stop| *stop).await;
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), GatewayError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(error = %e, "Error serving HTTP");
            Err(GatewayError::Serve(e))
        }
        Err(e) => Err(GatewayError::Task(e.to_string())),
    }
}
