// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use campus_core::{IdentityStore, MemoryIdentityStore};

use crate::auth::{AuthService, Clock, ExpiringStore, MemoryStore, RevocationCache, SystemClock, TokenService};
use crate::catalog::CourseCatalog;
use crate::config::ApiConfig;
use crate::cookies::TokenCookies;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Authentication service.
    pub auth: AuthService,
    /// Course catalog.
    pub courses: Arc<CourseCatalog>,
    /// Token cookie helper.
    pub cookies: Arc<TokenCookies>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the authentication service.
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Returns the revocation cache.
    pub fn revocations(&self) -> &Arc<RevocationCache> {
        self.auth.revocations()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("addr", &self.config.socket_addr())
            .field("auth", &self.auth)
            .field("courses", &self.courses.len())
            .finish()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Unset collaborators fall back to in-memory implementations on the
/// system clock: an empty identity store, an empty catalog and a
/// `MemoryStore` for revocations.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    identities: Option<Arc<dyn IdentityStore>>,
    revocation_store: Option<Arc<dyn ExpiringStore>>,
    clock: Option<Arc<dyn Clock>>,
    courses: Option<Arc<CourseCatalog>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the identity store.
    pub fn identities(mut self, identities: Arc<dyn IdentityStore>) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Sets the store backing the revocation cache.
    pub fn revocation_store(mut self, store: Arc<dyn ExpiringStore>) -> Self {
        self.revocation_store = Some(store);
        self
    }

    /// Sets the clock used for revocation bookkeeping.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the course catalog.
    pub fn courses(mut self, courses: Arc<CourseCatalog>) -> Self {
        self.courses = Some(courses);
        self
    }

    /// Builds the AppState.
    ///
    /// Fails if the token service rejects its key configuration.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let tokens = TokenService::new(config.jwt.clone())
            .map_err(|e| ApiError::internal(format!("Token service: {}", e)))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .revocation_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new(clock.clone())));
        let revocations = RevocationCache::new(store, clock, config.revocation.clone());

        let identities = self
            .identities
            .unwrap_or_else(|| Arc::new(MemoryIdentityStore::new()));

        let auth = AuthService::new(identities, Arc::new(tokens), Arc::new(revocations));

        Ok(AppState {
            cookies: Arc::new(TokenCookies::new(config.cookies.clone())),
            config: Arc::new(config),
            auth,
            courses: self.courses.unwrap_or_default(),
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<CourseCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.courses.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;

    const PRIVATE_PEM: &str = include_str!("../testdata/jwt_private.pem");
    const PUBLIC_PEM: &str = include_str!("../testdata/jwt_public.pem");

    #[test]
    fn test_app_state_builder() {
        let state = AppState::builder()
            .config(ApiConfig::new(JwtConfig::new(PRIVATE_PEM, PUBLIC_PEM)))
            .courses(Arc::new(CourseCatalog::seed_demo()))
            .build()
            .unwrap();

        assert_eq!(state.courses.len(), 3);
        assert_eq!(state.auth().tokens().access_ttl_secs(), 900);
    }

    #[test]
    fn test_builder_rejects_missing_keys() {
        let result = AppState::builder().build();
        assert!(matches!(result, Err(ApiError::Internal { .. })));
    }
}
