// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed response bodies.

use campus_core::{Role, RuleSet, UserId};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthContext, TokenPair};

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: pair.access_expires_in,
        }
    }
}

// =============================================================================
// Current user
// =============================================================================

/// Identity and rules of the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role tags.
    pub roles: Vec<Role>,
    /// Rules carried by the access token.
    pub rules: RuleSet,
}

impl From<&AuthContext> for CurrentUserResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            id: ctx.user_id,
            name: ctx.name.clone(),
            email: ctx.email.clone(),
            roles: ctx.roles.clone(),
            rules: ctx.rules.clone(),
        }
    }
}
