//! Integration tests across the asset store, the HTTP gateway and the runtime.

pub mod flows;
pub mod lifecycle;
pub mod persistence;

use av_01_asset_store::{AssetGateway, AssetStoreService, StoreConfig};
use av_02_api_gateway::{build_router, ApiConfig, AppState, InFlight};
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;

pub const IP_A: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
pub const IP_B: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2));

/// In-memory store with `alice` / `wonderland` provisioned.
pub async fn memory_gateway() -> Arc<AssetStoreService<av_01_asset_store::InMemoryKVStore>> {
    let service = AssetStoreService::new_in_memory(StoreConfig::for_testing());
    service
        .provision_user("alice", "wonderland")
        .await
        .expect("provision alice");
    Arc::new(service)
}

pub fn router_for(gateway: Arc<dyn AssetGateway>) -> Router {
    let config = ApiConfig {
        max_upload_size: StoreConfig::for_testing().max_asset_size,
        ..Default::default()
    };
    build_router(
        AppState::new(gateway, config.max_upload_size),
        &config,
        InFlight::new(),
    )
}

/// Send one request from `ip`, returning status and body bytes.
pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    ip: IpAddr,
    body: impl Into<Body>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let mut req = builder.body(body.into()).expect("request");
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 50000)));

    let response = router.clone().oneshot(req).await.expect("infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, bytes.to_vec())
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("json body")
}

/// Log in as `login` from `ip` and return the token.
pub async fn login(router: &Router, login: &str, password: &str, ip: IpAddr) -> String {
    let body = serde_json::json!({ "login": login, "password": password }).to_string();
    let (status, bytes) = call(router, "POST", "/api/auth", None, ip, body).await;
    assert_eq!(status, StatusCode::OK, "login failed: {:?}", json(&bytes));
    json(&bytes)["token"]
        .as_str()
        .expect("token field")
        .to_string()
}
