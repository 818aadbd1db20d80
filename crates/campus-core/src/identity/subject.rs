// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The authenticated principal.

use serde::{Deserialize, Serialize};

use super::password::CredentialHasher;
use super::types::{Role, UserId};
use crate::ability::Grant;

// =============================================================================
// Subject
// =============================================================================

/// A user known to the identity store.
///
/// Roles are fixed for the lifetime of a session; grants are mutable records
/// persisted with the subject and picked up on the next login or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique numeric id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    /// Role tags in assignment order.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Explicit grants, evaluated before role rules.
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl Subject {
    /// Creates a builder.
    pub fn builder(id: UserId, name: impl Into<String>, email: impl Into<String>) -> SubjectBuilder {
        SubjectBuilder::new(id, name, email)
    }

    /// Checks a password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        CredentialHasher::verify(password, &self.password_hash)
    }

    /// Returns `true` if the subject holds the role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

// =============================================================================
// SubjectBuilder
// =============================================================================

/// Builder for [`Subject`].
#[derive(Debug)]
pub struct SubjectBuilder {
    subject: Subject,
}

impl SubjectBuilder {
    /// Creates a builder with no roles, grants or password.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject: Subject {
                id,
                name: name.into(),
                email: email.into(),
                password_hash: String::new(),
                roles: Vec::new(),
                grants: Vec::new(),
            },
        }
    }

    /// Adds a role. Duplicates are ignored.
    pub fn role(mut self, role: Role) -> Self {
        if !self.subject.roles.contains(&role) {
            self.subject.roles.push(role);
        }
        self
    }

    /// Adds an explicit grant.
    pub fn grant(mut self, grant: Grant) -> Self {
        self.subject.grants.push(grant);
        self
    }

    /// Sets an already computed password hash.
    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.subject.password_hash = hash.into();
        self
    }

    /// Builds the subject.
    pub fn build(self) -> Subject {
        self.subject
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_dedupes_roles() {
        let subject = Subject::builder(UserId::new(1), "Admin User", "admin@user.com")
            .role(Role::Admin)
            .role(Role::Admin)
            .build();
        assert_eq!(subject.roles, vec![Role::Admin]);
        assert!(subject.has_role(Role::Admin));
        assert!(!subject.has_role(Role::Student));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let subject = Subject::builder(UserId::new(1), "A", "a@user.com")
            .password_hash("$argon2id$secret")
            .build();
        let json = serde_json::to_value(&subject).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@user.com");
    }

    #[test]
    fn test_empty_hash_never_verifies() {
        let subject = Subject::builder(UserId::new(1), "A", "a@user.com").build();
        assert!(!subject.verify_password(""));
    }
}
