//! # RocksDB Storage Adapter
//!
//! Persistent implementation of the `KeyValueStore` port.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch)
//! - Snappy compression
//! - Bloom filters for point lookups (token and account reads)
//! - Optional fsync on every write
//!
//! All record kinds share the default column family; the key prefixes
//! (`user:`, `token:`, `asset:`) keep them apart.

use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::PathBuf;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/assets"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a RocksDB database
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| KVStoreError::IOError {
            message: format!("failed to open RocksDB at {}: {}", config.path.display(), e),
        })?;

        Ok(Self { db, config })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }

    fn scan<T>(
        &self,
        prefix: &[u8],
        mut map: impl FnMut(Box<[u8]>, Box<[u8]>) -> T,
    ) -> Result<Vec<T>, KVStoreError> {
        let mut out = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB iteration failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push(map(key, value));
        }
        Ok(out)
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB put failed: {}", e),
            })
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB delete failed: {}", e),
            })
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.get(key).map(|v| v.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.scan(prefix, |k, v| (k.into_vec(), v.into_vec()))
    }

    fn prefix_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, KVStoreError> {
        self.scan(prefix, |k, _| k.into_vec())
    }

    fn flush(&mut self) -> Result<(), KVStoreError> {
        self.db.flush().map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB flush failed: {}", e),
        })
    }
}
