//! # Node Configuration
//!
//! Unified configuration for the vault node, loaded from `AV_*` environment
//! variables on top of typed defaults.
//!
//! | Variable                       | Default         |
//! |--------------------------------|-----------------|
//! | `AV_HTTP_HOST`                 | `0.0.0.0`       |
//! | `AV_HTTP_PORT`                 | `8086`          |
//! | `AV_BACKEND`                   | `rocksdb`       |
//! | `AV_DATA_DIR`                  | `./data/assets` |
//! | `AV_TOKEN_TTL_SECS`            | `86400`         |
//! | `AV_TOKEN_PURGE_INTERVAL_SECS` | `300`           |
//! | `AV_MAX_ASSET_BYTES`           | `67108864`      |
//! | `AV_SHUTDOWN_GRACE_SECS`       | `10`            |
//! | `AV_USERS`                     | (none)          |
//! | `AV_TRUSTED_PROXIES`           | (none)          |

use av_01_asset_store::StoreConfig;
use av_02_api_gateway::ApiConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// HTTP server configuration.
    pub http: HttpConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Token configuration.
    pub tokens: TokenConfig,
    /// Accounts provisioned at startup.
    pub users: Vec<UserSpec>,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("AV_USERS entry {0:?} is not login:password")]
    MalformedUser(String),

    #[error("unknown backend {0:?} (expected rocksdb or memory)")]
    UnknownBackend(String),
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Largest asset accepted, in bytes.
    pub max_asset_bytes: usize,
    pub shutdown_grace: Duration,
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8086,
            max_asset_bytes: 64 * 1024 * 1024,
            shutdown_grace: Duration::from_secs(10),
            trusted_proxies: Vec::new(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    RocksDb,
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rocksdb" => Ok(Backend::RocksDb),
            "memory" => Ok(Backend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Data directory for the RocksDB backend.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::RocksDb,
            data_dir: PathBuf::from("./data/assets"),
        }
    }
}

/// Token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub ttl: Duration,
    /// How often expired token records are removed.
    pub purge_interval: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            purge_interval: Duration::from_secs(300),
        }
    }
}

/// One `login:password` pair from `AV_USERS`.
#[derive(Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = NodeConfig::default();

        if let Some(v) = lookup("AV_HTTP_HOST") {
            config.http.host = parse("AV_HTTP_HOST", &v)?;
        }
        if let Some(v) = lookup("AV_HTTP_PORT") {
            config.http.port = parse("AV_HTTP_PORT", &v)?;
        }
        if let Some(v) = lookup("AV_MAX_ASSET_BYTES") {
            config.http.max_asset_bytes = parse("AV_MAX_ASSET_BYTES", &v)?;
        }
        if let Some(v) = lookup("AV_SHUTDOWN_GRACE_SECS") {
            config.http.shutdown_grace = Duration::from_secs(parse("AV_SHUTDOWN_GRACE_SECS", &v)?);
        }
        if let Some(v) = lookup("AV_TRUSTED_PROXIES") {
            config.http.trusted_proxies = split_list(&v)
                .map(|ip| parse("AV_TRUSTED_PROXIES", ip))
                .collect::<Result<_, _>>()?;
        }

        if let Some(v) = lookup("AV_BACKEND") {
            config.storage.backend = v.parse()?;
        }
        if let Some(v) = lookup("AV_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(v);
        }

        if let Some(v) = lookup("AV_TOKEN_TTL_SECS") {
            config.tokens.ttl = Duration::from_secs(parse("AV_TOKEN_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("AV_TOKEN_PURGE_INTERVAL_SECS") {
            config.tokens.purge_interval =
                Duration::from_secs(parse("AV_TOKEN_PURGE_INTERVAL_SECS", &v)?);
        }

        if let Some(v) = lookup("AV_USERS") {
            config.users = split_list(&v).map(parse_user).collect::<Result<_, _>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.max_asset_bytes == 0 {
            return Err(ConfigError::Zero("AV_MAX_ASSET_BYTES"));
        }
        if self.tokens.ttl.is_zero() {
            return Err(ConfigError::Zero("AV_TOKEN_TTL_SECS"));
        }
        if self.tokens.purge_interval.is_zero() {
            return Err(ConfigError::Zero("AV_TOKEN_PURGE_INTERVAL_SECS"));
        }
        Ok(())
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            host: self.http.host,
            port: self.http.port,
            max_upload_size: self.http.max_asset_bytes,
            shutdown_grace: self.http.shutdown_grace,
            trusted_proxies: self.http.trusted_proxies.clone(),
            ..Default::default()
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            token_ttl: self.tokens.ttl,
            max_asset_size: self.http.max_asset_bytes,
        }
    }
}

fn parse<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_user(entry: &str) -> Result<UserSpec, ConfigError> {
    match entry.split_once(':') {
        Some((login, password)) if !login.is_empty() && !password.is_empty() => Ok(UserSpec {
            login: login.to_string(),
            password: password.to_string(),
        }),
        _ => Err(ConfigError::MalformedUser(
            entry.split(':').next().unwrap_or_default().to_string(),
        )),
    }
}
