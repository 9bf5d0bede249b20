use crate::models::{place_key, Coordinates};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCacheService;
pub use self::redis::RedisCacheService;

/// Outcome of one geocoding lookup. Misses are cached too, so an unknown
/// place name does not hit the providers again until the entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeEntry {
    pub coordinates: Option<Coordinates>,
}

impl GeocodeEntry {
    pub fn hit(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
        }
    }

    pub fn miss() -> Self {
        Self { coordinates: None }
    }
}

/// Cache key for a place name; spelling and case variants share an entry.
pub fn geocode_cache_key(place: &str) -> String {
    format!("geocode:{}", place_key(place))
}

/// Storage for geocoding results. Backend failures are logged and read as
/// misses; they never fail the caller.
#[async_trait]
pub trait GeocodeCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<GeocodeEntry>;

    async fn put(&self, key: &str, entry: GeocodeEntry);

    async fn get_stats(&self) -> CacheStats;

    async fn health_check(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub connected: bool,
}

impl CacheStats {
    pub(crate) fn from_counts(hits: u64, misses: u64, connected: bool) -> Self {
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            connected,
        }
    }
}
