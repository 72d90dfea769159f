// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bounded least-recently-used eviction decorator

use std::collections::VecDeque;

use log::debug;
use parking_lot::Mutex;

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Caps the entry count of the wrapped cache; inserting past capacity
/// evicts the least recently touched key.
pub struct LruCache {
    delegate: Box<dyn Cache>,
    capacity: usize,
    /// Recency order, least recent at the front.
    order: Mutex<VecDeque<CacheKey>>,
}

impl LruCache {
    pub fn new(delegate: Box<dyn Cache>, capacity: usize) -> Self {
        LruCache {
            delegate,
            capacity: capacity.max(1),
            order: Mutex::new(VecDeque::new()),
        }
    }

    fn touch(&self, key: &CacheKey) {
        let mut order = self.order.lock();
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
        order.push_back(key.clone());
    }

    fn evict_overflow(&self) -> Option<CacheKey> {
        let mut order = self.order.lock();
        if order.len() > self.capacity {
            order.pop_front()
        } else {
            None
        }
    }
}

impl Cache for LruCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let entry = self.delegate.get(key)?;
        if entry.is_some() {
            self.touch(key);
        }
        Ok(entry)
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.delegate.put(key.clone(), entry)?;
        self.touch(&key);
        if let Some(evicted) = self.evict_overflow() {
            debug!("cache '{}' evicting LRU entry", self.id());
            self.delegate.remove(&evicted)?;
        }
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut order = self.order.lock();
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
        drop(order);
        self.delegate.remove(key)
    }

    fn clear(&self) {
        self.order.lock().clear();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
