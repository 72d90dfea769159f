// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Deterministic composite cache keys
//!
//! A key is the ordered fold of everything that identifies one statement
//! invocation: statement id, pagination bounds, final SQL text, each bound
//! parameter value in descriptor order, and the environment id. The
//! running checksum gives a cheap hash; the retained contribution list
//! backs full equality, so hash collisions can never produce a false hit.

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::types::Value;

const CHECKSUM_MULTIPLIER: u64 = 37;

/// Order-sensitive composite key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKey {
    checksum: u64,
    count: u32,
    contributions: Vec<Value>,
    /// Marks the canonical degenerate key, distinct from every built key.
    null: bool,
}

impl Default for CacheKey {
    fn default() -> Self {
        CacheKey::new()
    }
}

impl CacheKey {
    pub fn new() -> Self {
        CacheKey {
            checksum: 17,
            count: 0,
            contributions: Vec::new(),
            null: false,
        }
    }

    /// The canonical degenerate key. It never equals a built key, so
    /// combining thin keys can never alias a real cache slot; equality is
    /// still reflexive, keeping the `Eq` contract intact.
    pub fn null_key() -> Self {
        CacheKey {
            checksum: 0,
            count: 0,
            contributions: Vec::new(),
            null: true,
        }
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn contribution_count(&self) -> u32 {
        self.count
    }

    /// Fold one value into the key. Order matters: the same values in a
    /// different order produce a different key.
    pub fn update(&mut self, value: Value) {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        let base = hasher.finish();
        self.checksum = self
            .checksum
            .wrapping_mul(CHECKSUM_MULTIPLIER)
            .wrapping_add(base);
        self.count += 1;
        self.contributions.push(value);
    }

    /// Deep combination for correlating parent and child rows in joined
    /// result construction. Only meaningful when both sides carry more
    /// than one contribution; otherwise the null key.
    pub fn combine(&self, other: &CacheKey) -> CacheKey {
        if self.null || other.null || self.count <= 1 || other.count <= 1 {
            return CacheKey::null_key();
        }
        let mut combined = CacheKey::new();
        for value in self.contributions.iter().chain(&other.contributions) {
            combined.update(value.clone());
        }
        combined
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.null == other.null
            && self.checksum == other.checksum
            && self.count == other.count
            && self.contributions == other.contributions
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.checksum.hash(state);
        self.count.hash(state);
    }
}
