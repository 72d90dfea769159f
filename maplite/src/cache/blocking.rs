// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Single-flight blocking decorator
//!
//! Guards each missing key with its own latch so concurrent requests for
//! the same key never duplicate the underlying computation. A `get` miss
//! leaves the caller holding the key's latch; the latch is released by a
//! later `put` (value computed) or `remove` (computation abandoned). A
//! concurrent caller finding a latch in place waits for its release, then
//! retries its own `get` and observes the first caller's value.
//!
//! Locks live in an explicit per-key table, keeping unrelated keys fully
//! independent; there is no global serialization here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::trace;
use parking_lot::{Condvar, Mutex};

use super::{Cache, CacheEntry, CacheKey};
use crate::error::CacheError;

struct Latch {
    released: Mutex<bool>,
    condvar: Condvar,
}

impl Latch {
    fn new() -> Self {
        Latch {
            released: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn release(&self) {
        *self.released.lock() = true;
        self.condvar.notify_all();
    }
}

pub struct BlockingCache {
    delegate: Box<dyn Cache>,
    locks: Mutex<HashMap<CacheKey, Arc<Latch>>>,
    timeout: Option<Duration>,
}

impl BlockingCache {
    pub fn new(delegate: Box<dyn Cache>, timeout: Option<Duration>) -> Self {
        BlockingCache {
            delegate,
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Take the key's latch, waiting out any holder. Returns once this
    /// caller owns the latch registered in the table.
    fn acquire(&self, key: &CacheKey) -> Result<(), CacheError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            let existing = {
                let mut locks = self.locks.lock();
                match locks.get(key) {
                    None => {
                        locks.insert(key.clone(), Arc::new(Latch::new()));
                        return Ok(());
                    }
                    Some(latch) => Arc::clone(latch),
                }
            };

            let mut released = existing.released.lock();
            while !*released {
                match deadline {
                    Some(deadline) => {
                        if existing
                            .condvar
                            .wait_until(&mut released, deadline)
                            .timed_out()
                            && !*released
                        {
                            return Err(CacheError::LockTimeout {
                                cache_id: self.id().to_string(),
                                waited_ms: self
                                    .timeout
                                    .unwrap_or_default()
                                    .as_millis()
                                    as u64,
                            });
                        }
                    }
                    None => existing.condvar.wait(&mut released),
                }
            }
            // Holder released; race for the table slot again.
        }
    }

    fn release(&self, key: &CacheKey) {
        if let Some(latch) = self.locks.lock().remove(key) {
            latch.release();
        }
    }
}

impl Cache for BlockingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        self.acquire(key)?;
        match self.delegate.get(key) {
            Ok(Some(entry)) => {
                self.release(key);
                Ok(Some(entry))
            }
            Ok(None) => {
                // Keep the latch: this caller is now responsible for
                // putting or removing the key.
                trace!("cache '{}' holding lock for missing key", self.id());
                Ok(None)
            }
            Err(e) => {
                self.release(key);
                Err(e)
            }
        }
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let result = self.delegate.put(key.clone(), entry);
        self.release(&key);
        result
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let result = self.delegate.remove(key);
        self.release(key);
        result
    }

    fn clear(&self) {
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
