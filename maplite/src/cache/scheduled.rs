// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Interval-based clearing decorator

use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

/// Clears the whole cache when more than the configured interval has
/// elapsed since the last clear. Checked lazily on each access; there is
/// no background task.
pub struct ScheduledCache {
    delegate: Box<dyn Cache>,
    clear_interval: Duration,
    last_clear: Mutex<Instant>,
}

impl ScheduledCache {
    pub fn new(delegate: Box<dyn Cache>, clear_interval: Duration) -> Self {
        ScheduledCache {
            delegate,
            clear_interval,
            last_clear: Mutex::new(Instant::now()),
        }
    }

    fn clear_when_stale(&self) {
        let mut last_clear = self.last_clear.lock();
        if last_clear.elapsed() > self.clear_interval {
            debug!("cache '{}' interval elapsed, clearing", self.delegate.id());
            self.delegate.clear();
            *last_clear = Instant::now();
        }
    }
}

impl Cache for ScheduledCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.clear_when_stale();
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.clear_when_stale();
        self.delegate.put(key, entry)
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.clear_when_stale();
        self.delegate.remove(key)
    }

    fn clear(&self) {
        *self.last_clear.lock() = Instant::now();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.clear_when_stale();
        self.delegate.size()
    }
}
