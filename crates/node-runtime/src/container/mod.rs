//! # Gateway Container
//!
//! Opens the configured backend, provisions startup accounts and hands out
//! the asset store behind the two roles the runtime needs: the request-facing
//! [`AssetGateway`] and the background [`TokenMaintenance`].

pub mod config;

pub use config::{Backend, ConfigError, NodeConfig, UserSpec};

use async_trait::async_trait;
use av_01_asset_store::{
    AssetGateway, AssetStoreService, InMemoryKVStore, KeyValueStore, RocksDbConfig, RocksDbStore,
    StoreError,
};
use std::sync::Arc;
use tracing::info;

/// Periodic housekeeping on the asset store.
#[async_trait]
pub trait TokenMaintenance: Send + Sync {
    async fn purge_expired_tokens(&self) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S: KeyValueStore> TokenMaintenance for AssetStoreService<S> {
    async fn purge_expired_tokens(&self) -> Result<usize, StoreError> {
        AssetStoreService::purge_expired_tokens(self).await
    }
}

/// The opened asset store, shared by the HTTP server and background tasks.
#[derive(Clone)]
pub struct GatewayContainer {
    pub gateway: Arc<dyn AssetGateway>,
    pub maintenance: Arc<dyn TokenMaintenance>,
}

impl GatewayContainer {
    /// Open the backend named in `config` and provision its users.
    pub async fn open(config: &NodeConfig) -> Result<Self, StoreError> {
        let store_config = config.store_config();

        match config.storage.backend {
            Backend::Memory => {
                info!("Using in-memory backend; data is lost on exit");
                Self::wire(AssetStoreService::new(InMemoryKVStore::new(), store_config), &config.users).await
            }
            Backend::RocksDb => {
                info!(path = %config.storage.data_dir.display(), "Opening RocksDB backend");
                let rocks_config = RocksDbConfig {
                    path: config.storage.data_dir.clone(),
                    ..Default::default()
                };
                let store = tokio::task::spawn_blocking(move || RocksDbStore::open(rocks_config))
                    .await
                    .map_err(|e| StoreError::Task(format!("open backend: {e}")))??;
                Self::wire(AssetStoreService::new(store, store_config), &config.users).await
            }
        }
    }

    async fn wire<S: KeyValueStore>(
        service: AssetStoreService<S>,
        users: &[UserSpec],
    ) -> Result<Self, StoreError> {
        for user in users {
            service.provision_user(&user.login, &user.password).await?;
        }
        info!(accounts = users.len(), "Startup accounts provisioned");

        let service = Arc::new(service);
        Ok(Self {
            gateway: Arc::clone(&service) as Arc<dyn AssetGateway>,
            maintenance: service,
        })
    }
}
