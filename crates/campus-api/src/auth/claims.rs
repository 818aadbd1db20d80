// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use std::fmt;

use campus_core::{Role, RuleSet, Subject, UserId};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{TokenError, TokenResult};

// =============================================================================
// TokenKind
// =============================================================================

/// Access or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token carrying the rule set.
    Access,
    /// Long-lived token carrying identity only.
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject: the numeric user id as a string.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// JWT ID, the revocation key.
    pub jti: String,

    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Display name.
    pub name: String,

    /// Email.
    pub email: String,

    /// Role tags. Unknown tags fail deserialization.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Token kind.
    pub typ: TokenKind,

    /// Resolved rule set, access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<RuleSet>,
}

impl Claims {
    /// Creates claims for a subject with a fresh `jti`.
    ///
    /// `rules` is dropped for refresh tokens.
    pub fn new(
        subject: &Subject,
        kind: TokenKind,
        rules: Option<&RuleSet>,
        issued_at: i64,
        ttl_secs: i64,
    ) -> Self {
        Self {
            sub: subject.id.to_string(),
            exp: issued_at + ttl_secs,
            iat: issued_at,
            jti: Uuid::now_v7().to_string(),
            iss: None,
            name: subject.name.clone(),
            email: subject.email.clone(),
            roles: subject.roles.clone(),
            typ: kind,
            permissions: match kind {
                TokenKind::Access => rules.cloned(),
                TokenKind::Refresh => None,
            },
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Parses the subject id.
    pub fn user_id(&self) -> TokenResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| TokenError::invalid("subject is not a user id"))
    }

    /// Returns `true` if the claims carry the role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns the embedded rule set, or an empty one.
    pub fn rules(&self) -> RuleSet {
        self.permissions.clone().unwrap_or_default()
    }

    /// Returns `true` if `now` is past `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// Unverified Decoding
// =============================================================================

/// Decodes a token's claims without checking signature or expiry.
///
/// Only for bookkeeping on tokens whose authenticity does not matter, such
/// as reading the `jti` of a token being revoked. Never use the result for
/// an authorization decision.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> TokenResult<T> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.insecure_disable_signature_validation();

    decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(TokenError::from)
}

// =============================================================================
// TokenPair
// =============================================================================

/// An access and refresh token issued together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub access_expires_in: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expires_in: i64,
    /// `jti` of the access token.
    #[serde(skip)]
    pub access_jti: String,
    /// `jti` of the refresh token.
    #[serde(skip)]
    pub refresh_jti: String,
}

// =============================================================================
// Tests
// =============================================================================
