// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Unbounded base cache store

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

/// Plain hash-map store; every decorator stack bottoms out here.
pub struct PerpetualCache {
    id: String,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl PerpetualCache {
    pub fn new(id: impl Into<String>) -> Self {
        PerpetualCache {
            id: id.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Cache for PerpetualCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.lock().insert(key, entry);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn size(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn basic_operations() {
        let cache = PerpetualCache::new("session");
        let mut key = CacheKey::new();
        key.update(Value::Integer(1));

        assert_eq!(cache.get(&key).expect("get"), None);
        cache
            .put(key.clone(), CacheEntry::Ready(Value::from("row")))
            .expect("put");
        assert_eq!(cache.size(), 1);
        assert_eq!(
            cache.get(&key).expect("get"),
            Some(CacheEntry::Ready(Value::from("row")))
        );
        cache.remove(&key).expect("remove");
        assert_eq!(cache.size(), 0);
        cache
            .put(key.clone(), CacheEntry::Pending)
            .expect("put");
        cache.clear();
        assert_eq!(cache.size(), 0);
    }
}
