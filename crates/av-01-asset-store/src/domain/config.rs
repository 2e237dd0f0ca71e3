//! Store configuration.

use std::time::Duration;

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum asset size (64 MiB).
pub const DEFAULT_MAX_ASSET_SIZE: usize = 64 * 1024 * 1024;

/// Asset store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long an issued token stays valid.
    pub token_ttl: Duration,
    /// Uploads larger than this are not created.
    pub max_asset_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            max_asset_size: DEFAULT_MAX_ASSET_SIZE,
        }
    }
}

impl StoreConfig {
    /// Config for tests (short TTL, small assets).
    pub fn for_testing() -> Self {
        Self {
            token_ttl: Duration::from_secs(60),
            max_asset_size: 1024 * 1024,
        }
    }
}
