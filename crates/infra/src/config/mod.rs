//! Engine configuration

mod loader;

use serde::{Deserialize, Serialize};
use visapath_domain::constants::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS};

pub use loader::{load, load_from_env, load_from_file};

/// Top-level configuration for the analytics adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Row-store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Response-cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: DEFAULT_CACHE_TTL_SECS, max_entries: DEFAULT_CACHE_MAX_ENTRIES }
    }
}

fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_max_entries() -> u64 {
    DEFAULT_CACHE_MAX_ENTRIES
}
