// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Expiring key-value storage and clocks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    /// Returns the current Unix timestamp.
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock at `start`.
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Creates a clock at the current wall time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now().timestamp())
    }

    /// Moves the clock forward.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Sets the clock.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// =============================================================================
// ExpiringStore
// =============================================================================

/// Errors from an expiring store backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend failed.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("Corrupt cache entry '{key}': {message}")]
    Corrupt {
        /// Entry key.
        key: String,
        /// Decode error.
        message: String,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store whose entries may carry a time to live.
#[async_trait]
pub trait ExpiringStore: Send + Sync {
    /// Stores a value. `None` keeps it until removed.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    /// Returns a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Removes a value, returning `true` if it existed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Drops expired entries, returning how many were dropped.
    async fn purge_expired(&self) -> CacheResult<usize>;

    /// Drops every entry.
    async fn flush(&self) -> CacheResult<()>;
}

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    deadline: Option<i64>,
}

impl Slot {
    fn is_live(&self, now: i64) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

/// In-process expiring store.
///
/// Expired entries are invisible to `get` and dropped lazily or by
/// `purge_expired`.
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates a store on the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl ExpiringStore for MemoryStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let deadline = ttl.map(|ttl| {
            let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            self.clock.now().saturating_add(secs)
        });
        self.entries.insert(key.to_string(), Slot { value, deadline });
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(slot) if slot.is_live(now) => return Ok(Some(slot.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        // The read guard is released above; drop the stale entry.
        self.entries.remove_if(key, |_, slot| !slot.is_live(now));
        Ok(None)
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn flush(&self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = MemoryStore::new(clock.clone());
        (clock, store)
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let (clock, store) = store();
        store
            .set("a", "1".to_string(), Some(Duration::from_secs(10)))
            .await
            .unwrap();

        clock.advance(9);
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        clock.advance(1);
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let (clock, store) = store();
        store.set("p", "x".to_string(), None).await.unwrap();
        clock.advance(i64::from(u32::MAX));
        assert!(store.get("p").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_and_flush() {
        let (clock, store) = store();
        store.set("short", "1".to_string(), Some(Duration::from_secs(5))).await.unwrap();
        store.set("long", "2".to_string(), Some(Duration::from_secs(50))).await.unwrap();
        store.set("forever", "3".to_string(), None).await.unwrap();

        clock.advance(10);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 2);

        assert!(store.remove("long").await.unwrap());
        assert!(!store.remove("long").await.unwrap());

        store.flush().await.unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(5);
        clock.advance(3);
        assert_eq!(clock.now(), 8);
        clock.set(100);
        assert_eq!(clock.now(), 100);
    }
}
