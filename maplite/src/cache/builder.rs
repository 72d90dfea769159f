// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache stack construction

use std::sync::Arc;
use std::time::Duration;

use super::{
    BlockingCache, Cache, LruCache, PerpetualCache, ScheduledCache, SerializedCache, StatsCache,
    SynchronizedCache, WeakCache,
};

/// Entry retention strategy for the base of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Unbounded retention.
    None,
    /// Bounded count with least-recently-used eviction.
    Lru { capacity: usize },
    /// Reference-based retention; entries may be reclaimed once they age
    /// out of the strong-reference window.
    Weak { strong_entries: usize },
}

/// Assembles a decorator stack in the one order that keeps the behaviors
/// composable: eviction closest to the store, then scheduled clearing,
/// serialization, statistics, synchronization, and blocking outermost. A
/// blocked caller's retry therefore always goes through the synchronized,
/// deserializing layers.
pub struct CacheBuilder {
    id: String,
    eviction: EvictionPolicy,
    clear_interval: Option<Duration>,
    serialized: bool,
    stats: bool,
    synchronized: bool,
    blocking: bool,
    blocking_timeout: Option<Duration>,
}

impl CacheBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        CacheBuilder {
            id: id.into(),
            eviction: EvictionPolicy::Lru {
                capacity: super::lru::DEFAULT_CAPACITY,
            },
            clear_interval: None,
            serialized: false,
            stats: false,
            synchronized: true,
            blocking: false,
            blocking_timeout: None,
        }
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_clear_interval(mut self, interval: Duration) -> Self {
        self.clear_interval = Some(interval);
        self
    }

    /// Deep-copy values in and out so callers can mutate results freely.
    pub fn with_serialization(mut self, enabled: bool) -> Self {
        self.serialized = enabled;
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats = enabled;
        self
    }

    /// Caches shared across sessions keep this on; only an externally
    /// serialized cache may turn it off.
    pub fn with_synchronization(mut self, enabled: bool) -> Self {
        self.synchronized = enabled;
        self
    }

    /// Single-flight blocking for cache-stampede protection.
    pub fn with_blocking(mut self, enabled: bool) -> Self {
        self.blocking = enabled;
        self
    }

    pub fn with_blocking_timeout(mut self, timeout: Duration) -> Self {
        self.blocking_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Arc<dyn Cache> {
        let mut cache: Box<dyn Cache> = match self.eviction {
            EvictionPolicy::None => Box::new(PerpetualCache::new(self.id)),
            EvictionPolicy::Lru { capacity } => Box::new(LruCache::new(
                Box::new(PerpetualCache::new(self.id)),
                capacity,
            )),
            EvictionPolicy::Weak { strong_entries } => {
                Box::new(WeakCache::new(self.id, strong_entries))
            }
        };
        if let Some(interval) = self.clear_interval {
            cache = Box::new(ScheduledCache::new(cache, interval));
        }
        if self.serialized {
            cache = Box::new(SerializedCache::new(cache));
        }
        if self.stats {
            cache = Box::new(StatsCache::new(cache));
        }
        if self.synchronized {
            cache = Box::new(SynchronizedCache::new(cache));
        }
        if self.blocking {
            cache = Box::new(BlockingCache::new(cache, self.blocking_timeout));
        }
        Arc::from(cache)
    }
}
