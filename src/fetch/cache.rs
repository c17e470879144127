// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result caching for fetched pages
//!
//! TTL-bounded, LRU-evicting cache so repeated conversions of the same URL
//! skip the strategy chain.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::FetchResult;

struct CacheEntry {
    value: FetchResult,
    created_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCacheStats {
    /// Entries currently held (expired ones included until touched)
    pub total: usize,
    /// Held entries past their TTL
    pub expired: usize,
    /// Capacity bound
    pub max: usize,
    pub hits: u64,
    pub misses: u64,
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Thread-safe result cache with TTL and LRU eviction
pub struct ResultCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    max_entries: NonZeroUsize,
}

impl ResultCache {
    /// Create a new result cache
    ///
    /// # Arguments
    /// * `ttl` - Time-to-live for entries
    /// * `max_entries` - Capacity; zero is treated as one
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(max_entries),
                hits: 0,
                misses: 0,
            }),
            ttl,
            max_entries,
        }
    }

    /// Get a cached result if present and not expired
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, url: &str) -> Option<FetchResult> {
        let mut inner = self.inner.lock().ok()?;
        let key = Self::normalize_url(url);

        let lookup = inner
            .entries
            .get(&key)
            .map(|entry| (entry.created_at.elapsed() < self.ttl, entry.value.clone()));

        let fresh = match lookup {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                inner.entries.pop(&key);
                None
            }
            None => None,
        };

        match fresh {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        fresh
    }

    /// Insert a result, evicting the least recently used entry when full
    pub fn put(&self, url: &str, value: FetchResult) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.entries.put(
            Self::normalize_url(url),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Whether a fresh entry exists, without touching recency or stats
    pub fn contains(&self, url: &str) -> bool {
        let Ok(inner) = self.inner.lock() else {
            return false;
        };
        inner
            .entries
            .peek(&Self::normalize_url(url))
            .map(|e| e.created_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> ResultCacheStats {
        let Ok(inner) = self.inner.lock() else {
            return ResultCacheStats {
                total: 0,
                expired: 0,
                max: self.max_entries.get(),
                hits: 0,
                misses: 0,
            };
        };
        let expired = inner
            .entries
            .iter()
            .filter(|(_, e)| e.created_at.elapsed() >= self.ttl)
            .count();
        ResultCacheStats {
            total: inner.entries.len(),
            expired,
            max: self.max_entries.get(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Normalize URL for cache key
    ///
    /// Scheme and host are case-insensitive and get lowercased by the parser;
    /// path and query keep their case. A trailing slash is dropped.
    fn normalize_url(url: &str) -> String {
        let url = url.trim();
        let normalized = match url::Url::parse(url) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => url.to_string(),
        };
        normalized.trim_end_matches('/').to_string()
    }
}
