//! Route table.

use crate::domain::config::ApiConfig;
use crate::handlers::{self, AppState};
use crate::middleware::{ClientIpLayer, DrainLayer, InFlight, TracingLayer, TrustedProxyConfig};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Build the HTTP router.
///
/// Unmatched paths get a 404 `{"error": "not found"}`.
pub fn build_router(state: AppState, config: &ApiConfig, in_flight: Arc<InFlight>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(DrainLayer::new(in_flight))
        .layer(TracingLayer::new())
        .layer(ClientIpLayer::new(TrustedProxyConfig {
            trusted_proxies: config.trusted_proxies.clone(),
        }));

    Router::new()
        .route(
            "/api/auth",
            post(handlers::authenticate).layer(DefaultBodyLimit::max(config.max_auth_body)),
        )
        .route("/api/upload-asset/:asset", post(handlers::upload_asset))
        .route(
            "/api/asset/:asset",
            get(handlers::download_asset).delete(handlers::delete_asset),
        )
        .route("/api/asset", get(handlers::list_assets))
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found)
        .layer(middleware)
        .with_state(state)
}
