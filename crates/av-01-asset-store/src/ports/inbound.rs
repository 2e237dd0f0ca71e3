//! # Inbound Port (Driving Port)
//!
//! The capability the HTTP front-end is handed at construction time. Each
//! method is one atomic procedure: no intermediate state is observable and
//! every auth-gated call re-validates the `(token, ip)` pair itself.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::IpAddr;

use crate::domain::entities::{AssetAccess, AssetListing, AuthOutcome, Token};
use crate::domain::errors::StoreError;

/// Atomic asset store procedures.
///
/// Implementations must support concurrent use from many request tasks;
/// how the underlying storage is serialized or pooled is the
/// implementation's concern, not the caller's.
///
/// `Err` is reserved for infrastructure failures. Authorization failures,
/// missing assets and rejected uploads are `Ok` outcomes.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Check credentials and issue a token bound to `ip`.
    async fn authenticate(
        &self,
        login: &str,
        password: &str,
        ip: IpAddr,
    ) -> Result<AuthOutcome, StoreError>;

    /// Pure validity check of a `(token, ip)` pair. No side effects.
    async fn check_token(&self, token: &Token, ip: IpAddr) -> Result<bool, StoreError>;

    /// Store `content` under `name` in the token owner's namespace.
    ///
    /// Returns `false` when the asset was not created.
    async fn upload_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
        content: Bytes,
    ) -> Result<bool, StoreError>;

    /// Fetch an asset from the token owner's namespace.
    async fn download_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
    ) -> Result<AssetAccess<Vec<u8>>, StoreError>;

    /// Remove an asset from the token owner's namespace.
    async fn delete_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
    ) -> Result<AssetAccess<()>, StoreError>;

    /// Names in the token owner's namespace, ascending.
    async fn list_assets(&self, token: &Token, ip: IpAddr) -> Result<AssetListing, StoreError>;

    /// Release the underlying storage. Called once all callers have drained.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
