// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Mutual-exclusion decorator

use parking_lot::Mutex;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

/// Serializes every operation on the wrapped cache. Required on any
/// namespace cache shared across concurrently active sessions; the inner
/// decorators assume exclusive access per operation.
pub struct SynchronizedCache {
    delegate: Box<dyn Cache>,
    lock: Mutex<()>,
}

impl SynchronizedCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        SynchronizedCache {
            delegate,
            lock: Mutex::new(()),
        }
    }
}

impl Cache for SynchronizedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let _guard = self.lock.lock();
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        self.delegate.put(key, entry)
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let _guard = self.lock.lock();
        self.delegate.remove(key)
    }

    fn clear(&self) {
        let _guard = self.lock.lock();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        let _guard = self.lock.lock();
        self.delegate.size()
    }
}
