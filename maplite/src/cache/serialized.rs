// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Serialization-at-rest decorator

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;
use crate::types::Value;

/// Deep-copies values on the way in and out by encoding them at rest.
/// Callers may freely mutate returned values without corrupting cached
/// state, at the cost of an encode per put and a decode per hit.
pub struct SerializedCache {
    delegate: Box<dyn Cache>,
}

impl SerializedCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        SerializedCache { delegate }
    }

    fn encode(&self, entry: CacheEntry) -> Result<CacheEntry, CacheError> {
        match entry {
            CacheEntry::Ready(value) => {
                let bytes =
                    bincode::serialize(&value).map_err(|e| CacheError::Serialization {
                        cache_id: self.id().to_string(),
                        detail: e.to_string(),
                    })?;
                Ok(CacheEntry::Serialized(bytes))
            }
            other => Ok(other),
        }
    }

    fn decode(&self, entry: CacheEntry) -> Result<CacheEntry, CacheError> {
        match entry {
            CacheEntry::Serialized(bytes) => {
                let value: Value =
                    bincode::deserialize(&bytes).map_err(|e| CacheError::Deserialization {
                        cache_id: self.id().to_string(),
                        detail: e.to_string(),
                    })?;
                Ok(CacheEntry::Ready(value))
            }
            other => Ok(other),
        }
    }
}

impl Cache for SerializedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        match self.delegate.get(key)? {
            Some(entry) => Ok(Some(self.decode(entry)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let encoded = self.encode(entry)?;
        self.delegate.put(key, encoded)
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
