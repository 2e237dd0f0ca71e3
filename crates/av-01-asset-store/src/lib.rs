//! # Asset Store (av-01)
//!
//! The Asset Store is the authoritative owner of accounts, tokens and asset
//! blobs. The HTTP front-end never touches storage directly: it calls the six
//! atomic procedures exposed by the [`AssetGateway`] port and translates their
//! outcomes into responses.
//!
//! ## Procedures
//!
//! ```text
//! authenticate(login, password, ip) ──→ Granted(token) | Denied | NotIssued
//! check_token(token, ip)            ──→ bool
//! upload_asset(token, ip, name, ..) ──→ bool (created)
//! download_asset(token, ip, name)   ──→ Unauthorized | Missing | Present(bytes)
//! delete_asset(token, ip, name)     ──→ Unauthorized | Missing | Present(())
//! list_assets(token, ip)            ──→ Unauthorized | Names([..])
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | IP Binding | A token validates only from the IP it was issued to |
//! | 2 | No Existence Leak | Asset existence is never evaluated for an unauthorized caller |
//! | 3 | Atomic Procedures | Token check and data access happen under one store lock |
//! | 4 | Owner Namespaces | An account only ever sees assets it uploaded |
//! | 5 | Fail Closed | Unknown login, wrong password and disabled account never yield a token |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, outcomes, errors, configuration, password hashing
//! - `ports/` - Inbound gateway API and outbound key-value SPI
//! - `adapters/` - In-memory and RocksDB key-value stores
//! - `service/` - `AssetStoreService` implementing the gateway
//!
//! ## Usage
//!
//! ```ignore
//! use av_01_asset_store::{AssetGateway, AssetStoreService, StoreConfig};
//!
//! let service = AssetStoreService::new_in_memory(StoreConfig::default());
//! service.provision_user("alice", "secret").await?;
//!
//! let outcome = service.authenticate("alice", "secret", ip).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::config::StoreConfig;
pub use domain::entities::{
    AccountRecord, AssetAccess, AssetListing, AuthOutcome, Timestamp, Token, TokenRecord,
};
pub use domain::errors::{KVStoreError, StoreError};
pub use ports::inbound::AssetGateway;
pub use ports::outbound::{BatchOperation, KeyValueStore, SystemTimeSource, TimeSource};
pub use service::AssetStoreService;
