//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the Asset Store service.
//!
//! Production: `RocksDbStore` (adapters/rocksdb.rs)
//! Testing: `InMemoryKVStore` (adapters/memory.rs)

use crate::domain::entities::Timestamp;
use crate::domain::errors::KVStoreError;

/// Result of a prefix scan: `(key, value)` pairs in ascending key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
pub trait KeyValueStore: Send + 'static {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    /// Iterate over key-value pairs with a prefix, ascending by key.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Keys with a prefix, ascending. Avoids materializing large values.
    fn prefix_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, KVStoreError> {
        Ok(self
            .prefix_scan(prefix)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Persist buffered writes before the store is released.
    fn flush(&mut self) -> Result<(), KVStoreError> {
        Ok(())
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Default time source using system time.
#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
