// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token revocation cache.
//!
//! Entries are keyed by `jti`. A rotation leaves a non-permanent entry whose
//! grace window still accepts the superseded token; a logout leaves a
//! permanent entry. Entries of either kind are evicted once the token itself
//! is past `exp` plus leeway, after which the expiry check alone blocks it.
//! Every failure to read a token or an entry resolves to "blocked".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::claims::decode_unverified;
use super::store::{CacheError, CacheResult, Clock, ExpiringStore};

// =============================================================================
// Configuration
// =============================================================================

/// Revocation cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Seconds a rotated token stays usable.
    pub grace_secs: i64,
    /// Clock skew tolerance applied to token expiry.
    pub leeway_secs: i64,
    /// Interval between expired-entry sweeps.
    #[serde(with = "crate::config::duration_secs")]
    pub sweep_interval: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            grace_secs: 60,
            leeway_secs: 60,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// RevocationEntry
// =============================================================================

/// A stored revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationEntry {
    /// End of the grace window. For permanent entries, the revocation time.
    pub expires_at: i64,
    /// Blocked regardless of time.
    pub permanent: bool,
}

impl RevocationEntry {
    /// Returns `true` if the entry blocks its token at `now`.
    pub fn blocks_at(&self, now: i64) -> bool {
        self.permanent || now >= self.expires_at
    }
}

/// The claims the cache reads from a token.
#[derive(Debug, Deserialize)]
struct TokenIdentity {
    jti: String,
    exp: i64,
}

fn identify(token: &str) -> Option<TokenIdentity> {
    match decode_unverified::<TokenIdentity>(token) {
        Ok(identity) if !identity.jti.is_empty() => Some(identity),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable token presented to revocation cache");
            None
        }
    }
}

fn cache_key(jti: &str) -> String {
    format!("revoked:{}", jti)
}

// =============================================================================
// RevocationCache
// =============================================================================

/// Tracks invalidated tokens.
pub struct RevocationCache {
    store: Arc<dyn ExpiringStore>,
    clock: Arc<dyn Clock>,
    config: RevocationConfig,
}

impl RevocationCache {
    /// Creates a cache over an expiring store.
    pub fn new(store: Arc<dyn ExpiringStore>, clock: Arc<dyn Clock>, config: RevocationConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RevocationConfig {
        &self.config
    }

    /// Invalidates a token.
    ///
    /// Returns `false` if the token cannot be read or the store fails. An
    /// already revoked token returns `true` and its entry is left as is.
    pub async fn invalidate(&self, token: &str, permanent: bool) -> bool {
        let Some(identity) = identify(token) else {
            tracing::warn!("Refusing to invalidate an unreadable token");
            return false;
        };

        match self.try_invalidate(&identity, permanent).await {
            Ok(created) => {
                if created {
                    tracing::debug!(jti = %identity.jti, permanent, "Token invalidated");
                }
                true
            }
            Err(e) => {
                tracing::warn!(jti = %identity.jti, error = %e, "Failed to record revocation");
                false
            }
        }
    }

    async fn try_invalidate(&self, identity: &TokenIdentity, permanent: bool) -> CacheResult<bool> {
        let key = cache_key(&identity.jti);
        if self.store.get(&key).await?.is_some() {
            return Ok(false);
        }

        let now = self.clock.now();
        let token_end = identity.exp + self.config.leeway_secs;
        let (entry, evict_at) = if permanent {
            let entry = RevocationEntry {
                expires_at: now,
                permanent: true,
            };
            (entry, token_end)
        } else {
            let expires_at = now + self.config.grace_secs;
            let entry = RevocationEntry {
                expires_at,
                permanent: false,
            };
            (entry, expires_at.max(token_end))
        };
        let ttl = Duration::from_secs(u64::try_from(evict_at - now).unwrap_or(0).max(1));

        let value = serde_json::to_string(&entry).map_err(|e| CacheError::Corrupt {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.store.set(&key, value, Some(ttl)).await?;
        Ok(true)
    }

    /// Returns `true` if the token must be refused.
    ///
    /// Unreadable tokens, tokens past `exp` plus leeway, permanent entries,
    /// grace windows that have ended and store failures all block.
    pub async fn is_blocked(&self, token: &str) -> bool {
        let Some(identity) = identify(token) else {
            return true;
        };

        let now = self.clock.now();
        if now > identity.exp + self.config.leeway_secs {
            return true;
        }

        match self.entry(&identity.jti).await {
            Ok(Some(entry)) => entry.blocks_at(now),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(jti = %identity.jti, error = %e, "Revocation lookup failed, treating token as blocked");
                true
            }
        }
    }

    /// Returns the entry recorded for a `jti`.
    pub async fn entry(&self, jti: &str) -> CacheResult<Option<RevocationEntry>> {
        let key = cache_key(jti);
        match self.store.get(&key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Corrupt {
                    key,
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Drops expired entries.
    pub async fn sweep(&self) -> CacheResult<usize> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "Swept expired revocations");
        }
        Ok(purged)
    }

    /// Runs [`sweep`](Self::sweep) on the configured interval until
    /// `shutdown` resolves.
    pub fn spawn_sweeper<F>(self: &Arc<Self>, shutdown: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cache = Arc::clone(self);
        let period = cache.config.sweep_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = cache.sweep().await {
                            tracing::warn!(error = %e, "Revocation sweep failed");
                        }
                    }
                    _ = &mut shutdown => {
                        tracing::debug!("Revocation sweeper stopping");
                        break;
                    }
                }
            }
        })
    }

    /// Flushes the backing store.
    pub async fn close(&self) -> CacheResult<()> {
        self.store.flush().await?;
        tracing::info!("Revocation cache flushed");
        Ok(())
    }
}

impl std::fmt::Debug for RevocationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{ManualClock, MemoryStore};
    use crate::auth::{Claims, JwtConfig, TokenKind, TokenService};
    use campus_core::{ability, Role, Subject, UserId};

    const PRIVATE_PEM: &str = include_str!("../../testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../testdata/jwt_public.pem");

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        cache: RevocationCache,
        tokens: TokenService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let cache = RevocationCache::new(store.clone(), clock.clone(), RevocationConfig::default());
        let tokens = TokenService::new(JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)).unwrap();
        Fixture {
            clock,
            store,
            cache,
            tokens,
        }
    }

    fn token(f: &Fixture, kind: TokenKind) -> String {
        let subject = Subject::builder(UserId::new(4), "Student User1", "student1@user.com")
            .role(Role::Student)
            .build();
        let rules = ability::resolve(&subject).unwrap();
        let token = f.tokens.issue(&subject, &rules, kind).unwrap();

        // Align the cache clock with the token's issue time.
        let claims: Claims = decode_unverified(&token).unwrap();
        f.clock.set(claims.iat);
        token
    }

    #[tokio::test]
    async fn test_fresh_token_not_blocked() {
        let f = fixture();
        assert!(!f.cache.is_blocked(&token(&f, TokenKind::Access)).await);
    }

    #[tokio::test]
    async fn test_permanent_blocks_forever() {
        let f = fixture();
        let t = token(&f, TokenKind::Refresh);

        assert!(f.cache.invalidate(&t, true).await);
        assert!(f.cache.is_blocked(&t).await);

        for step in [1, 3_600, 86_400 * 30] {
            f.clock.advance(step);
            assert!(f.cache.is_blocked(&t).await);
        }
    }

    #[tokio::test]
    async fn test_permanent_entries_evicted_after_token_expiry() {
        let f = fixture();
        let tokens: Vec<String> = (0..20).map(|_| token(&f, TokenKind::Access)).collect();
        for t in &tokens {
            assert!(f.cache.invalidate(t, true).await);
        }
        assert_eq!(f.store.len(), tokens.len());

        // Still inside every token's lifetime.
        f.clock.advance(900);
        assert_eq!(f.cache.sweep().await.unwrap(), 0);

        f.clock.advance(86_400 * 365);
        assert_eq!(f.cache.sweep().await.unwrap(), tokens.len());
        assert!(f.store.is_empty());
        for t in &tokens {
            assert!(f.cache.is_blocked(t).await);
        }
    }

    #[tokio::test]
    async fn test_grace_window() {
        let f = fixture();
        let t = token(&f, TokenKind::Refresh);

        assert!(f.cache.invalidate(&t, false).await);
        assert!(!f.cache.is_blocked(&t).await);

        f.clock.advance(59);
        assert!(!f.cache.is_blocked(&t).await);

        f.clock.advance(1);
        assert!(f.cache.is_blocked(&t).await);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let f = fixture();
        let t = token(&f, TokenKind::Refresh);
        let jti = decode_unverified::<TokenIdentity>(&t).unwrap().jti;

        assert!(f.cache.invalidate(&t, false).await);
        let first = f.cache.entry(&jti).await.unwrap().unwrap();

        f.clock.advance(30);
        assert!(f.cache.invalidate(&t, true).await);
        let second = f.cache.entry(&jti).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert!(!second.permanent);
    }

    #[tokio::test]
    async fn test_unreadable_token() {
        let f = fixture();
        assert!(!f.cache.invalidate("not-a-token", true).await);
        assert!(f.cache.is_blocked("not-a-token").await);
        assert!(f.cache.is_blocked("").await);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_is_blocked() {
        let f = fixture();
        let t = token(&f, TokenKind::Access);

        f.clock.advance(900 + 60);
        assert!(!f.cache.is_blocked(&t).await);
        f.clock.advance(1);
        assert!(f.cache.is_blocked(&t).await);
    }

    #[tokio::test]
    async fn test_grace_entry_evicted_after_token_expiry() {
        let f = fixture();
        let t = token(&f, TokenKind::Access);
        assert!(f.cache.invalidate(&t, false).await);

        f.clock.advance(900);
        assert_eq!(f.cache.sweep().await.unwrap(), 0);

        f.clock.advance(61);
        assert_eq!(f.cache.sweep().await.unwrap(), 1);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_close_flushes() {
        let f = fixture();
        let t = token(&f, TokenKind::Refresh);
        f.cache.invalidate(&t, true).await;
        f.cache.close().await.unwrap();
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let f = fixture();
        let cache = Arc::new(f.cache);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = cache.spawn_sweeper(async move {
            let _ = rx.await;
        });
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
