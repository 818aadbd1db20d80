// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login, refresh and logout orchestration.

use std::sync::Arc;

use campus_core::identity::CredentialHasher;
use campus_core::{ability, IdentityStore, Subject};

use super::claims::{Claims, TokenKind, TokenPair};
use super::error::{AuthError, AuthResult, RefreshFailure};
use super::jwt::TokenService;
use super::revocation::RevocationCache;

/// Authentication service.
///
/// Tokens are the session: nothing is persisted besides revocation entries.
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityStore>,
    tokens: Arc<TokenService>,
    revocations: Arc<RevocationCache>,
}

impl AuthService {
    /// Creates the service from its collaborators.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<TokenService>,
        revocations: Arc<RevocationCache>,
    ) -> Self {
        Self {
            identities,
            tokens,
            revocations,
        }
    }

    /// Returns the token service.
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Returns the revocation cache.
    pub fn revocations(&self) -> &Arc<RevocationCache> {
        &self.revocations
    }

    /// Returns the identity store.
    pub fn identities(&self) -> &Arc<dyn IdentityStore> {
        &self.identities
    }

    /// Checks credentials and issues a token pair.
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let found = self
            .identities
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::internal(format!("identity lookup failed: {}", e)))?;

        let subject = match found {
            Some(subject) if subject.verify_password(password) => subject,
            Some(subject) => {
                tracing::warn!(reason = "password_mismatch", user_id = %subject.id, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                CredentialHasher::verify_dummy(password);
                tracing::warn!(reason = "unknown_email", "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let pair = self.issue_for(&subject)?;
        tracing::info!(user_id = %subject.id, jti = %pair.access_jti, "Login succeeded");
        Ok(pair)
    }

    /// Rotates a refresh token.
    ///
    /// The rule set is resolved again from the current subject. The old
    /// token is invalidated with a grace window only after the new pair has
    /// been issued.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(AuthError::invalid_refresh_token)?;

        if self.revocations.is_blocked(refresh_token).await {
            tracing::warn!(jti = %claims.jti, user_id = %claims.sub, "Revoked refresh token presented");
            return Err(AuthError::invalid_refresh_token(RefreshFailure::Revoked));
        }

        let user_id = claims.user_id().map_err(AuthError::invalid_refresh_token)?;
        let subject = self
            .identities
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::invalid_refresh_token(RefreshFailure::Lookup(e.to_string())))?
            .ok_or_else(|| {
                AuthError::invalid_refresh_token(RefreshFailure::SubjectNotFound(user_id))
            })?;

        let pair = self.issue_for(&subject)?;

        if !self.revocations.invalidate(refresh_token, false).await {
            tracing::warn!(jti = %claims.jti, "Could not invalidate rotated refresh token");
        }

        tracing::info!(
            user_id = %subject.id,
            old_jti = %claims.jti,
            new_jti = %pair.refresh_jti,
            "Refresh token rotated"
        );
        Ok(pair)
    }

    /// Permanently invalidates whichever tokens are given. Never fails.
    pub async fn logout(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        let mut revoked = 0usize;
        for token in [access_token, refresh_token].into_iter().flatten() {
            if self.revocations.invalidate(token, true).await {
                revoked += 1;
            } else {
                tracing::warn!("Logout could not invalidate a presented token");
            }
        }
        tracing::info!(revoked, "Logout");
    }

    /// Verifies an access token and checks it has not been revoked.
    pub async fn verify_access_token(&self, token: &str) -> AuthResult<Claims> {
        let claims = self
            .tokens
            .verify(token, TokenKind::Access)
            .map_err(AuthError::from_access_token)?;

        if self.revocations.is_blocked(token).await {
            return Err(AuthError::invalid_access_token("token has been revoked"));
        }
        Ok(claims)
    }

    /// Returns `true` if the token is revoked or unreadable.
    pub async fn is_token_blocked(&self, token: &str) -> bool {
        self.revocations.is_blocked(token).await
    }

    fn issue_for(&self, subject: &Subject) -> AuthResult<TokenPair> {
        let rules = ability::resolve(subject)?;
        self.tokens
            .issue_pair(subject, &rules)
            .map_err(|e| AuthError::internal(e.to_string()))
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("revocations", &self.revocations)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
