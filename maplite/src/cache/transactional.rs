// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transactional staging buffer for shared caches
//!
//! A namespace cache is shared across sessions, so results produced inside
//! an uncommitted transaction must not become visible to other sessions
//! until that transaction commits. `TransactionalCache` holds puts in a
//! local buffer and replays them on commit; reads always go to the real
//! cache, never the buffer, so a session cannot observe its own
//! uncommitted rows through the shared cache either.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

/// Session-local write buffer in front of one shared cache.
pub struct TransactionalCache {
    delegate: Arc<dyn Cache>,
    clear_on_commit: bool,
    staged: HashMap<CacheKey, CacheEntry>,
    /// Keys this session looked up and did not find. On commit any key
    /// still unanswered gets a terminal `remove`, which releases a
    /// blocking decorator's single-flight latch for that key.
    missed: HashSet<CacheKey>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        TransactionalCache {
            delegate,
            clear_on_commit: false,
            staged: HashMap::new(),
            missed: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.delegate.id()
    }

    /// Read through to the shared cache. Staged entries are invisible even
    /// to this session. After a staged clear, hits are suppressed because
    /// the underlying entries are doomed.
    pub fn get(&mut self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let entry = self.delegate.get(key)?;
        if entry.is_none() {
            self.missed.insert(key.clone());
        }
        if self.clear_on_commit {
            return Ok(None);
        }
        Ok(entry)
    }

    pub fn put(&mut self, key: CacheKey, entry: CacheEntry) {
        self.staged.insert(key, entry);
    }

    /// Defers the clear to commit time and drops staged puts that the
    /// clear would have destroyed anyway.
    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.staged.clear();
    }

    /// Publish the buffer: clear first if staged, then replay puts, then
    /// issue a `remove` for every miss that never got an answer.
    pub fn commit(&mut self) -> Result<(), CacheError> {
        if self.clear_on_commit {
            self.delegate.clear();
        }
        let staged_keys: HashSet<CacheKey> = self.staged.keys().cloned().collect();
        for (key, entry) in self.staged.drain() {
            self.delegate.put(key, entry)?;
        }
        for key in self.missed.drain() {
            if !staged_keys.contains(&key) {
                self.delegate.remove(&key)?;
            }
        }
        self.reset();
        Ok(())
    }

    /// Discard the buffer. Misses are still removed from the shared cache
    /// so no waiter is left holding a latch for a result that will never
    /// arrive.
    pub fn rollback(&mut self) -> Result<(), CacheError> {
        for key in self.missed.drain() {
            if let Err(err) = self.delegate.remove(&key) {
                warn!(
                    "cache {}: unlocking missed entry on rollback failed: {}",
                    self.delegate.id(),
                    err
                );
            }
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.staged.clear();
        self.missed.clear();
    }
}

/// One transactional buffer per distinct namespace cache touched during a
/// session. Commit and rollback fan out to every buffer.
#[derive(Default)]
pub struct TransactionalCacheManager {
    caches: HashMap<String, TransactionalCache>,
}

impl TransactionalCacheManager {
    pub fn new() -> Self {
        TransactionalCacheManager::default()
    }

    fn buffer(&mut self, cache: &Arc<dyn Cache>) -> &mut TransactionalCache {
        self.caches
            .entry(cache.id().to_string())
            .or_insert_with(|| TransactionalCache::new(Arc::clone(cache)))
    }

    pub fn get(
        &mut self,
        cache: &Arc<dyn Cache>,
        key: &CacheKey,
    ) -> Result<Option<CacheEntry>, CacheError> {
        self.buffer(cache).get(key)
    }

    pub fn put(&mut self, cache: &Arc<dyn Cache>, key: CacheKey, entry: CacheEntry) {
        self.buffer(cache).put(key, entry);
    }

    pub fn clear(&mut self, cache: &Arc<dyn Cache>) {
        debug!("staging clear of cache {}", cache.id());
        self.buffer(cache).clear();
    }

    pub fn commit(&mut self) -> Result<(), CacheError> {
        for buffer in self.caches.values_mut() {
            buffer.commit()?;
        }
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<(), CacheError> {
        for buffer in self.caches.values_mut() {
            buffer.rollback()?;
        }
        Ok(())
    }
}
