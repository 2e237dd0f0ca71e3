//! # Asset Store Service
//!
//! Implements the [`AssetGateway`] port over any [`KeyValueStore`].
//!
//! ## Concurrency
//!
//! The store sits behind one mutex. Every procedure takes the lock for its
//! whole body on a blocking worker thread, so the token check and the data
//! operation of a procedure can never interleave with another procedure.
//!
//! Authenticate is the one exception: Argon2 verification is deliberately
//! slow, so it runs between two short critical sections (read the account,
//! then issue the token only if the account is unchanged).
//!
//! ## Shutdown
//!
//! [`AssetGateway::close`] waits for the procedure currently holding the
//! lock, flushes and drops the store. Any later call fails with
//! [`StoreError::Closed`].

mod procedures;


use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::adapters::InMemoryKVStore;
use crate::domain::config::StoreConfig;
use crate::domain::entities::{
    is_valid_login, AccountRecord, AssetAccess, AssetListing, AuthOutcome, Timestamp, Token,
};
use crate::domain::errors::StoreError;
use crate::domain::password::{hash_password, verify_password};
use crate::ports::inbound::AssetGateway;
use crate::ports::outbound::{KeyValueStore, SystemTimeSource, TimeSource};

/// Asset store over a key-value backend.
pub struct AssetStoreService<S: KeyValueStore> {
    store: Arc<Mutex<Option<S>>>,
    time: Arc<dyn TimeSource>,
    config: StoreConfig,
}

impl AssetStoreService<InMemoryKVStore> {
    /// Service backed by an in-memory store.
    pub fn new_in_memory(config: StoreConfig) -> Self {
        Self::new(InMemoryKVStore::new(), config)
    }
}

impl<S: KeyValueStore> AssetStoreService<S> {
    pub fn new(store: S, config: StoreConfig) -> Self {
        Self::with_time_source(store, config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(store: S, config: StoreConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Some(store))),
            time,
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `op` against the open store on a blocking worker thread.
    async fn with_store<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut S, Timestamp) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let time = Arc::clone(&self.time);

        tokio::task::spawn_blocking(move || {
            let mut guard = store.lock();
            let kv = guard.as_mut().ok_or(StoreError::Closed)?;
            f(kv, time.now())
        })
        .await
        .map_err(|e| StoreError::Task(format!("{op}: {e}")))?
    }

    /// Create an account, or reset the password of an existing one and
    /// re-enable it. Returns the account's namespace id.
    pub async fn provision_user(&self, login: &str, password: &str) -> Result<Uuid, StoreError> {
        if !is_valid_login(login) {
            return Err(StoreError::InvalidLogin(login.to_string()));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| StoreError::Task(format!("provision_user: {e}")))??;

        let login = login.to_string();
        let account_id = self
            .with_store("provision_user", move |kv, now| {
                let account = match procedures::load_account(kv, &login)? {
                    Some(existing) => AccountRecord {
                        password_hash,
                        disabled: false,
                        ..existing
                    },
                    None => AccountRecord {
                        account_id: Uuid::new_v4(),
                        login,
                        password_hash,
                        disabled: false,
                        created_at: now,
                    },
                };
                procedures::save_account(kv, &account)?;
                Ok(account.account_id)
            })
            .await?;

        info!(%account_id, "Account provisioned");
        Ok(account_id)
    }

    /// Disable an account. Its tokens stop validating immediately and it is
    /// never issued a new one until re-provisioned.
    pub async fn disable_user(&self, login: &str) -> Result<(), StoreError> {
        let login = login.to_string();
        self.with_store("disable_user", move |kv, _| {
            let mut account = procedures::load_account(kv, &login)?
                .ok_or_else(|| StoreError::UnknownAccount(login.clone()))?;
            account.disabled = true;
            procedures::save_account(kv, &account)
        })
        .await
    }

    /// Remove expired token records. Returns the number removed.
    pub async fn purge_expired_tokens(&self) -> Result<usize, StoreError> {
        let purged = self
            .with_store("purge_expired_tokens", procedures::purge_expired::<S>)
            .await?;
        if purged > 0 {
            debug!(purged, "Expired tokens purged");
        }
        Ok(purged)
    }
}

#[async_trait]
impl<S: KeyValueStore> AssetGateway for AssetStoreService<S> {
    async fn authenticate(
        &self,
        login: &str,
        password: &str,
        ip: IpAddr,
    ) -> Result<AuthOutcome, StoreError> {
        if !is_valid_login(login) {
            return Ok(AuthOutcome::Denied);
        }

        let owned_login = login.to_string();
        let account = self
            .with_store("authenticate", move |kv, _| {
                procedures::load_account(kv, &owned_login)
            })
            .await?;

        let account = match account {
            Some(account) => account,
            None => return Ok(AuthOutcome::Denied),
        };
        if account.disabled {
            return Ok(AuthOutcome::NotIssued);
        }

        let password = password.to_string();
        let stored_hash = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| StoreError::Task(format!("authenticate: {e}")))??;
        if !verified {
            return Ok(AuthOutcome::Denied);
        }

        let config = self.config.clone();
        let issued = self
            .with_store("authenticate", move |kv, now| {
                procedures::issue_token(kv, &config, &account.login, &account.password_hash, ip, now)
            })
            .await?;

        Ok(match issued {
            Some(token) => AuthOutcome::Granted(token),
            None => AuthOutcome::NotIssued,
        })
    }

    async fn check_token(&self, token: &Token, ip: IpAddr) -> Result<bool, StoreError> {
        let token = token.clone();
        self.with_store("check_token", move |kv, now| {
            Ok(procedures::resolve_owner(kv, &token, ip, now)?.is_some())
        })
        .await
    }

    async fn upload_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
        content: Bytes,
    ) -> Result<bool, StoreError> {
        let token = token.clone();
        let name = name.to_string();
        let config = self.config.clone();
        self.with_store("upload_asset", move |kv, now| {
            procedures::upload(kv, &config, &token, ip, &name, &content, now)
        })
        .await
    }

    async fn download_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
    ) -> Result<AssetAccess<Vec<u8>>, StoreError> {
        let token = token.clone();
        let name = name.to_string();
        self.with_store("download_asset", move |kv, now| {
            procedures::download(kv, &token, ip, &name, now)
        })
        .await
    }

    async fn delete_asset(
        &self,
        token: &Token,
        ip: IpAddr,
        name: &str,
    ) -> Result<AssetAccess<()>, StoreError> {
        let token = token.clone();
        let name = name.to_string();
        self.with_store("delete_asset", move |kv, now| {
            procedures::delete(kv, &token, ip, &name, now)
        })
        .await
    }

    async fn list_assets(&self, token: &Token, ip: IpAddr) -> Result<AssetListing, StoreError> {
        let token = token.clone();
        self.with_store("list_assets", move |kv, now| {
            procedures::list(kv, &token, ip, now)
        })
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        let store = Arc::clone(&self.store);
        let released = tokio::task::spawn_blocking(move || {
            let taken = store.lock().take();
            match taken {
                Some(mut kv) => kv.flush().map(|_| true),
                None => Ok(false),
            }
        })
        .await
        .map_err(|e| StoreError::Task(format!("close: {e}")))??;

        if released {
            info!("Asset store closed");
        }
        Ok(())
    }
}
