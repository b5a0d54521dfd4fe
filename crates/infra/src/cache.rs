//! Dashboard response cache
//!
//! Callers check this cache before invoking the engine and populate it
//! afterwards with a bounded TTL; the engine itself never touches it.
//! Read-your-writes with concurrent CRM mutations is explicitly not a
//! goal - correctness is eventual within the TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use visapath_domain::DashboardStats;

use crate::config::CacheConfig;

/// Cache key: one entry per `(endpoint, filter, bounds, actor, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: String,
    pub filter: String,
    pub after: Option<String>,
    pub before: Option<String>,
    pub actor_id: String,
    pub role: String,
}

/// TTL-bounded cache of assembled dashboard payloads.
pub struct DashboardCache {
    inner: Cache<CacheKey, Arc<DashboardStats>>,
}

impl DashboardCache {
    /// Create a cache with an explicit TTL and entry bound.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).max_capacity(max_entries).build(),
        }
    }

    /// Create a cache from loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_seconds), config.max_entries)
    }

    /// Fetch a cached payload, if present and fresh.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<DashboardStats>> {
        self.inner.get(key).await
    }

    /// Store a freshly computed payload.
    pub async fn insert(&self, key: CacheKey, value: Arc<DashboardStats>) {
        self.inner.insert(key, value).await;
    }

    /// Drop every cached payload, e.g. after a bulk data import.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
