// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Stores that fail on demand, for exercising the fail-closed paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use campus_api::auth::{CacheError, CacheResult, Clock, ExpiringStore, MemoryStore};
use campus_core::{IdentityStore, StoreError, StoreResult, Subject, UserId};

// =============================================================================
// FlakyStore
// =============================================================================

/// Revocation backend that can be switched into failure mode.
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    /// Creates a healthy store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: MemoryStore::new(clock),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every later operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Backend("backend offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ExpiringStore for FlakyStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        self.check()?;
        self.inner.purge_expired().await
    }

    async fn flush(&self) -> CacheResult<()> {
        self.check()?;
        self.inner.flush().await
    }
}

// =============================================================================
// UnavailableIdentityStore
// =============================================================================

/// Identity store whose backend is always down.
#[derive(Debug, Default)]
pub struct UnavailableIdentityStore;

#[async_trait]
impl IdentityStore for UnavailableIdentityStore {
    async fn find_by_email(&self, _email: &str) -> StoreResult<Option<Subject>> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn find_by_id(&self, _id: UserId) -> StoreResult<Option<Subject>> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn save(&self, _subject: Subject) -> StoreResult<Subject> {
        Err(StoreError::unavailable("connection refused"))
    }
}
