// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cache abstraction and stackable decorators
//!
//! A minimal key/value contract with behaviors composed by decoration:
//! bounded eviction, reference-based eviction, scheduled clearing,
//! serialization-at-rest, synchronization, and single-flight blocking.
//! Decorators exclusively own the cache they wrap; identity stays with the
//! innermost store's id. `CacheBuilder` enforces the stacking order so a
//! blocked caller's retry always observes a synchronized, deserialized
//! value.

pub mod blocking;
pub mod builder;
pub mod key;
pub mod lru;
pub mod perpetual;
pub mod scheduled;
pub mod serialized;
pub mod stats;
pub mod synchronized;
pub mod transactional;
pub mod weak;

use serde::{Deserialize, Serialize};

pub use blocking::BlockingCache;
pub use builder::{CacheBuilder, EvictionPolicy};
pub use key::CacheKey;
pub use lru::LruCache;
pub use perpetual::PerpetualCache;
pub use scheduled::ScheduledCache;
pub use serialized::SerializedCache;
pub use stats::StatsCache;
pub use synchronized::SynchronizedCache;
pub use transactional::{TransactionalCache, TransactionalCacheManager};
pub use weak::WeakCache;

use crate::error::CacheError;
use crate::types::Value;

/// One stored cache slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheEntry {
    /// In-flight sentinel: a query for this key has started but not yet
    /// produced a result. Re-entrant readers see "in flight", not absent.
    Pending,
    /// A materialized result.
    Ready(Value),
    /// At-rest encoded form used by the serializing decorator.
    Serialized(Vec<u8>),
}

impl CacheEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending)
    }

    /// Unwrap a ready value; pending or at-rest entries yield nothing.
    pub fn into_ready(self) -> Option<Value> {
        match self {
            CacheEntry::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Keyed store from `CacheKey` to stored results.
///
/// Implementations use interior mutability: one namespace (L2) instance is
/// shared by all sessions under that namespace. Identity, and therefore
/// cache equality, is the id of the innermost store.
pub trait Cache: Send + Sync {
    fn id(&self) -> &str;

    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<(), CacheError>;

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;

    fn clear(&self);

    fn size(&self) -> usize;
}
