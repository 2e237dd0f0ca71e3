//! # Storage Adapters
//!
//! `InMemoryKVStore` backs tests and the `memory` backend; `RocksDbStore`
//! (feature `rocksdb`) is the persistent production backend.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};
