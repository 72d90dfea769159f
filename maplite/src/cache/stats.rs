// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Hit-ratio tracking decorator

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

/// Counts requests and hits, logging the running ratio on each request.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub requests: u64,
    pub hits: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.requests as f64
        }
    }
}

pub struct StatsCache {
    delegate: Box<dyn Cache>,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl StatsCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        StatsCache {
            delegate,
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

impl Cache for StatsCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let entry = self.delegate.get(key)?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        if entry.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            "cache '{}' hit ratio {:.3}",
            self.id(),
            self.stats().hit_ratio()
        );
        Ok(entry)
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.delegate.put(key, entry)
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.delegate.remove(key)
    }

    fn clear(&self) {
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PerpetualCache;
    use crate::types::Value;

    #[test]
    fn tracks_hit_ratio() {
        let cache = StatsCache::new(Box::new(PerpetualCache::new("ns")));
        let mut key = CacheKey::new();
        key.update(Value::Integer(1));

        assert_eq!(cache.get(&key).expect("get"), None);
        cache
            .put(key.clone(), CacheEntry::Ready(Value::Integer(1)))
            .expect("put");
        assert!(cache.get(&key).expect("get").is_some());

        let stats = cache.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hits, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
