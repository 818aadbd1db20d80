// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use campus_core::filter::{to_filter, FilterTree};
use campus_core::{AbilityResult, PermittedFields, Role, RuleSet, UserId};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::error::{TokenError, TokenResult};
use super::Claims;

/// Identity and rules attached to an authenticated request.
///
/// The rule set is rebuilt from the access token, not looked up.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// User ID.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role tags.
    pub roles: Vec<Role>,
    /// Rules embedded in the token.
    pub rules: RuleSet,
    /// `jti` of the access token.
    pub token_id: String,
    /// Token expiry (Unix timestamp).
    pub expires_at: i64,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a context from verified access token claims.
    pub fn from_claims(claims: &Claims) -> TokenResult<Self> {
        let rules = claims
            .permissions
            .clone()
            .ok_or_else(|| TokenError::invalid("access token carries no rule set"))?;

        Ok(Self {
            user_id: claims.user_id()?,
            name: claims.name.clone(),
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            rules,
            token_id: claims.jti.clone(),
            expires_at: claims.exp,
            request_id: Uuid::now_v7(),
        })
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Type-level permission check.
    pub fn can(&self, action: &str, resource: &str) -> bool {
        self.rules.can(action, resource)
    }

    /// Instance-level permission check.
    pub fn can_on(&self, action: &str, resource: &str, instance: &Value) -> bool {
        self.rules.can_on(action, resource, instance)
    }

    /// Fields of `instance` usable with the action.
    pub fn permitted_fields(&self, action: &str, resource: &str, instance: &Value) -> PermittedFields {
        self.rules.permitted_fields(action, resource, Some(instance))
    }

    /// Fail-closed field check for updates.
    pub fn authorize_fields<I, S>(
        &self,
        action: &str,
        resource: &str,
        instance: &Value,
        requested: I,
    ) -> AbilityResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rules.authorize_fields(action, resource, instance, requested)
    }

    /// Row filter for listing, `None` when unrestricted.
    pub fn row_filter(&self, action: &str, resource: &str) -> Option<FilterTree> {
        to_filter(&self.rules, action, resource)
    }
}

// =============================================================================
// Tests
// =============================================================================
