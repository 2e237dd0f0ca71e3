//! Request handlers.
//!
//! Each handler runs a fixed sequence of gateway calls and stops at the
//! first failing check:
//!
//! 1. Gateway error → 500 with the error text, logged once with the handler name
//! 2. Authorization failure → 401
//! 3. Missing asset (only after authorization passed) → 404
//! 4. Success
//!
//! No other branch logs.

use crate::domain::error::ApiError;
use crate::domain::types::{Credentials, ResponseBody};
use crate::extract::BearerToken;
use crate::middleware::ClientIp;
use av_01_asset_store::{AssetAccess, AssetGateway, AssetListing, StoreError};
use axum::{
    body::{Body, Bytes},
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;
use tracing::error;

/// Status message for an upload the gateway refused to create.
pub const CANNOT_CREATE: &str = "cannot create asset";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn AssetGateway>,
    pub max_upload_size: usize,
}

impl AppState {
    pub fn new(gateway: Arc<dyn AssetGateway>, max_upload_size: usize) -> Self {
        Self {
            gateway,
            max_upload_size,
        }
    }
}

/// Log a gateway failure and turn it into a 500.
fn backend_failure(handler: &'static str, err: StoreError) -> ApiError {
    error!(handler, error = %err, "Gateway call failed");
    ApiError::internal(err.to_string())
}

fn json(status: StatusCode, body: ResponseBody) -> Response {
    (status, Json(body)).into_response()
}

/// `POST /api/auth`
pub async fn authenticate(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    // Untrusted input: rejected without logging.
    let body = body?;
    let credentials: Credentials =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let outcome = state
        .gateway
        .authenticate(&credentials.login, &credentials.password, ip)
        .await
        .map_err(|e| backend_failure("authenticate", e))?;

    match outcome.into_token() {
        Some(token) => Ok(json(StatusCode::OK, ResponseBody::token(token.as_str()))),
        None => Err(ApiError::invalid_credentials()),
    }
}

/// `POST /api/upload-asset/{name}`
///
/// The token is checked before the body is read, so unauthorized uploads
/// never stream their content into the gateway.
pub async fn upload_asset(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    BearerToken(token): BearerToken,
    name: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let Path(name) = name?;
    let valid = state
        .gateway
        .check_token(&token, ip)
        .await
        .map_err(|e| backend_failure("upload_asset", e))?;
    if !valid {
        return Err(ApiError::unauthorized());
    }

    let content = read_limited(&headers, body, state.max_upload_size).await?;

    let created = state
        .gateway
        .upload_asset(&token, ip, &name, content)
        .await
        .map_err(|e| backend_failure("upload_asset", e))?;

    if created {
        Ok(json(StatusCode::OK, ResponseBody::ok()))
    } else {
        Ok(json(StatusCode::BAD_REQUEST, ResponseBody::status(CANNOT_CREATE)))
    }
}

/// Collect at most `limit` bytes of body.
async fn read_limited(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ApiError::payload_too_large(limit));
    }

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::payload_too_large(limit))
        }
        Err(e) => Err(ApiError::bad_request(format!("failed to read body: {}", e))),
    }
}

/// `GET /api/asset/{name}`
pub async fn download_asset(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    BearerToken(token): BearerToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(name) = name?;
    let access = state
        .gateway
        .download_asset(&token, ip, &name)
        .await
        .map_err(|e| backend_failure("download_asset", e))?;

    match access {
        AssetAccess::Unauthorized => Err(ApiError::unauthorized()),
        AssetAccess::Missing => Err(ApiError::not_found()),
        AssetAccess::Present(content) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            content,
        )
            .into_response()),
    }
}

/// `DELETE /api/asset/{name}`
pub async fn delete_asset(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    BearerToken(token): BearerToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(name) = name?;
    let access = state
        .gateway
        .delete_asset(&token, ip, &name)
        .await
        .map_err(|e| backend_failure("delete_asset", e))?;

    match access {
        AssetAccess::Unauthorized => Err(ApiError::unauthorized()),
        AssetAccess::Missing => Err(ApiError::not_found()),
        AssetAccess::Present(()) => Ok(json(StatusCode::OK, ResponseBody::ok())),
    }
}

/// `GET /api/asset`
pub async fn list_assets(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    BearerToken(token): BearerToken,
) -> Result<Response, ApiError> {
    let listing = state
        .gateway
        .list_assets(&token, ip)
        .await
        .map_err(|e| backend_failure("list_assets", e))?;

    match listing {
        AssetListing::Unauthorized => Err(ApiError::unauthorized()),
        AssetListing::Names(names) => Ok(json(StatusCode::OK, ResponseBody::assets(names))),
    }
}

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    Json(ResponseBody::ok())
}

/// Any unmatched route.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

