use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::services::config_store::ParameterCategory;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// In-process cache for configuration store lookups
///
/// Entries are stored serialized so one cache can hold every parameter
/// shape. Only successful store reads are ever inserted; a fallback result
/// must not hide a store that has since recovered.
pub struct ParameterCache {
    entries: moka::sync::Cache<String, Vec<u8>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ParameterCache {
    /// Create a new cache holding at most `max_entries` for `ttl_secs`
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let entries = moka::sync::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a value from cache
    pub fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.entries.get(key) {
            match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Parameter cache hit: {}", key);
                    return Ok(value);
                }
                Err(e) => {
                    // Unreadable entries count as misses and are dropped
                    self.entries.invalidate(key);
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Dropped unreadable cache entry '{}': {}", key, e);
                    return Err(e.into());
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Parameter cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (uses configured TTL)
    pub fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key.to_string(), bytes);
        tracing::trace!("Parameter cache set: {}", key);
        Ok(())
    }

    /// Drop every entry so the next lookup goes back to the store
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        tracing::debug!("Invalidated parameter cache");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        let hit_count = self.hits.load(Ordering::Relaxed);
        let miss_count = self.misses.load(Ordering::Relaxed);
        let lookups = hit_count + miss_count;

        CacheStats {
            size: self.entries.entry_count(),
            hit_count,
            miss_count,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hit_count as f64 / lookups as f64
            },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for one parameter category
    pub fn parameters(category: ParameterCategory) -> String {
        format!("params:{}", category.as_str())
    }

    /// Build a cache key for a material lookup
    pub fn material(normalized_name: &str) -> String {
        format!("materials:{}", normalized_name)
    }

    /// Build a cache key for flight problem diagnostics
    pub fn flight_problems() -> String {
        "diagnostics:flight_problems".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_cache_set_get() {
        let cache = ParameterCache::new(100, 60);

        let key = CacheKey::parameters(ParameterCategory::BaseCalculation);
        let value = BTreeMap::from([("draw_weight_factor".to_string(), 12.5)]);

        cache.set(&key, &value).unwrap();
        let result: BTreeMap<String, f64> = cache.get(&key).unwrap();
        assert_eq!(result, value);

        assert!(matches!(
            cache.get::<BTreeMap<String, f64>>("params:unknown"),
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[test]
    fn test_unreadable_entry_is_a_miss() {
        let cache = ParameterCache::new(100, 60);
        let key = CacheKey::parameters(ParameterCategory::BaseCalculation);
        // NaN is written as null and cannot be read back as f64
        let value = BTreeMap::from([("spine_tolerance".to_string(), f64::NAN)]);

        cache.set(&key, &value).unwrap();
        assert!(matches!(
            cache.get::<BTreeMap<String, f64>>(&key),
            Err(CacheError::SerializationError(_))
        ));
        assert!(matches!(
            cache.get::<BTreeMap<String, f64>>(&key),
            Err(CacheError::CacheMiss(_))
        ));

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = ParameterCache::new(100, 60);
        cache.set(&CacheKey::material("wood"), &vec!["wood"]).unwrap();
        cache.set(&CacheKey::flight_problems(), &vec!["nock_left"]).unwrap();

        cache.invalidate_all();

        assert!(cache.get::<Vec<String>>(&CacheKey::material("wood")).is_err());
        assert!(cache.get::<Vec<String>>(&CacheKey::flight_problems()).is_err());
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = ParameterCache::new(100, 60);
        cache.set("k", &1u32).unwrap();

        let _ = cache.get::<u32>("k");
        let _ = cache.get::<u32>("missing");

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(
            CacheKey::parameters(ParameterCategory::BowAdjustments),
            "params:bow_adjustments"
        );
        assert_eq!(CacheKey::material("wood"), "materials:wood");
        assert_eq!(CacheKey::flight_problems(), "diagnostics:flight_problems");
    }
}
