//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tokens: TokensConfig,

    #[serde(default)]
    pub hash: HashConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Relational storage for user records
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// libpq-style connection string, e.g. `host=localhost user=postgres dbname=authkeep`
    #[serde(default)]
    pub url: Option<String>,
}

/// Access and refresh token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    /// HMAC signing secret for access tokens
    #[serde(default)]
    pub secret_key: String,

    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,

    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,

    /// Random bytes per refresh token, before base64 encoding
    #[serde(default = "default_refresh_bytes")]
    pub refresh_token_bytes: usize,
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_refresh_bytes() -> usize {
    32
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_ttl_secs: default_access_ttl(),
            refresh_token_ttl_secs: default_refresh_ttl(),
            refresh_token_bytes: default_refresh_bytes(),
        }
    }
}

impl TokensConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashConfig {
    /// bcrypt work factor
    #[serde(default = "default_cost")]
    pub cost: u32,
}

fn default_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            cost: default_cost(),
        }
    }
}

/// Where sessions and users live
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps; state is lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Upper bound on any single storage call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How often evicted sessions are purged
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_purge_interval() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            timeout_ms: default_timeout_ms(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

/// Smallest refresh token accepted, in random bytes
pub const MIN_REFRESH_TOKEN_BYTES: usize = 16;

/// bcrypt reads at most 72 bytes; 54 bytes base64-encode to exactly 72 chars
pub const MAX_REFRESH_TOKEN_BYTES: usize = 54;

/// Longest access or refresh token lifetime accepted (ten years)
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// bcrypt cost range
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

impl Config {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tokens.secret_key.trim().is_empty() {
            return Err(Error::Config("tokens.secret_key is empty".to_string()));
        }

        for (key, secs) in [
            ("tokens.access_token_ttl_secs", self.tokens.access_token_ttl_secs),
            ("tokens.refresh_token_ttl_secs", self.tokens.refresh_token_ttl_secs),
        ] {
            if secs > MAX_TOKEN_TTL_SECS {
                return Err(Error::Config(format!(
                    "{} must be at most {}, got {}",
                    key, MAX_TOKEN_TTL_SECS, secs
                )));
            }
        }

        if !(MIN_REFRESH_TOKEN_BYTES..=MAX_REFRESH_TOKEN_BYTES)
            .contains(&self.tokens.refresh_token_bytes)
        {
            return Err(Error::Config(format!(
                "tokens.refresh_token_bytes must be between {} and {}, got {}",
                MIN_REFRESH_TOKEN_BYTES, MAX_REFRESH_TOKEN_BYTES, self.tokens.refresh_token_bytes
            )));
        }

        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.hash.cost) {
            return Err(Error::Config(format!(
                "hash.cost must be between {} and {}, got {}",
                MIN_HASH_COST,
                MAX_HASH_COST,
                self.hash.cost
            )));
        }

        if self.storage.backend == StorageBackend::Postgres
            && self.database.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::Config(
                "database.url is required for the postgres backend".to_string(),
            ));
        }

        if self.storage.timeout_ms == 0 {
            return Err(Error::Config("storage.timeout_ms must be positive".to_string()));
        }

        if self.storage.purge_interval_secs == 0 {
            return Err(Error::Config(
                "storage.purge_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
