// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reference-based eviction decorator
//!
//! Entries are held through `Weak` references plus a bounded queue of
//! strong references keeping the most recently touched entries alive.
//! Once an entry ages out of the strong queue its storage drops and a
//! later `get` behaves as absent. This is the Rust rendition of
//! garbage-collected soft/weak entries: the strong queue plays the role
//! of available memory.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

pub const DEFAULT_STRONG_ENTRIES: usize = 256;

pub struct WeakCache {
    id: String,
    slots: Mutex<HashMap<CacheKey, Weak<CacheEntry>>>,
    strong: Mutex<VecDeque<Arc<CacheEntry>>>,
    strong_capacity: usize,
}

impl WeakCache {
    pub fn new(id: impl Into<String>, strong_capacity: usize) -> Self {
        WeakCache {
            id: id.into(),
            slots: Mutex::new(HashMap::new()),
            strong: Mutex::new(VecDeque::new()),
            strong_capacity: strong_capacity.max(1),
        }
    }

    fn retain_strong(&self, entry: Arc<CacheEntry>) {
        let mut strong = self.strong.lock();
        strong.push_back(entry);
        while strong.len() > self.strong_capacity {
            strong.pop_front();
        }
    }
}

impl Cache for WeakCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let upgraded = {
            let mut slots = self.slots.lock();
            match slots.get(key).and_then(Weak::upgrade) {
                Some(entry) => Some(entry),
                None => {
                    // Reclaimed (or never present): drop the dead slot.
                    slots.remove(key);
                    None
                }
            }
        };
        Ok(upgraded.map(|entry| {
            let cloned = (*entry).clone();
            self.retain_strong(entry);
            cloned
        }))
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let entry = Arc::new(entry);
        self.slots.lock().insert(key, Arc::downgrade(&entry));
        self.retain_strong(entry);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.slots.lock().remove(key);
        Ok(())
    }

    fn clear(&self) {
        self.strong.lock().clear();
        self.slots.lock().clear();
    }

    fn size(&self) -> usize {
        let mut slots = self.slots.lock();
        slots.retain(|_, slot| slot.strong_count() > 0);
        slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn key(n: i64) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::Integer(n));
        key
    }

    #[test]
    fn entries_survive_while_strongly_held() {
        let cache = WeakCache::new("ns", 8);
        cache
            .put(key(1), CacheEntry::Ready(Value::Integer(1)))
            .expect("put");
        assert!(cache.get(&key(1)).expect("get").is_some());
    }

    #[test]
    fn aged_out_entries_read_as_absent() {
        let cache = WeakCache::new("ns", 2);
        for n in 0..8 {
            cache
                .put(key(n), CacheEntry::Ready(Value::Integer(n)))
                .expect("put");
        }
        // Strong queue holds only the two newest; older entries dropped.
        assert_eq!(cache.get(&key(0)).expect("get"), None);
        assert!(cache.get(&key(7)).expect("get").is_some());
        assert!(cache.size() <= 2);
    }
}
