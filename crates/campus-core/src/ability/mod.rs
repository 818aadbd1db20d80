// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission rule engine.
//!
//! A subject's explicit grants and role-derived rules are resolved into an
//! immutable [`RuleSet`]. Later rules take priority over earlier ones, so
//! role rules (appended after explicit grants) win any conflict with an
//! inverted explicit grant.
//!
//! # Examples
//!
//! ```
//! use campus_core::ability::{self, actions, resources};
//! use campus_core::identity::{Role, Subject, UserId};
//! use serde_json::json;
//!
//! let teacher = Subject::builder(UserId::new(2), "Teacher User1", "teacher1@user.com")
//!     .role(Role::Teacher)
//!     .build();
//! let rules = ability::resolve(&teacher).unwrap();
//!
//! let course = json!({ "id": 1, "teacher": { "user": { "id": 2 } } });
//! assert!(rules.can(actions::UPDATE, resources::COURSE));
//! assert!(rules.can_on(actions::UPDATE, resources::COURSE, &course));
//! assert!(rules
//!     .authorize_fields(actions::UPDATE, resources::COURSE, &course, ["name"])
//!     .is_err());
//! ```

mod grant;
mod roles;
mod rule_set;

pub use grant::{Condition, Grant};
pub use roles::role_rules;
pub use rule_set::{PermittedFields, RuleSet};

use crate::error::AbilityResult;
use crate::identity::Subject;

/// Action names.
pub mod actions {
    /// Wildcard matching every action.
    pub const MANAGE: &str = "manage";
    /// Read.
    pub const GET: &str = "get";
    /// Create.
    pub const CREATE: &str = "create";
    /// Update.
    pub const UPDATE: &str = "update";
    /// Delete.
    pub const DELETE: &str = "delete";
}

/// Resource type names.
pub mod resources {
    /// Wildcard matching every resource.
    pub const ALL: &str = "all";
    /// Courses.
    pub const COURSE: &str = "Course";
    /// Users.
    pub const USER: &str = "User";
}

/// Resolves the rule set of a subject.
///
/// Explicit grants come first in stored order, then the rules of each role
/// in the subject's role order. A malformed explicit grant is an error.
pub fn resolve(subject: &Subject) -> AbilityResult<RuleSet> {
    let mut rules = subject.grants.clone();
    for role in &subject.roles {
        rules.extend(role_rules(*role, subject));
    }

    let rule_set = RuleSet::try_new(rules)?;
    tracing::debug!(
        user_id = %subject.id,
        rules = rule_set.len(),
        "Resolved rule set"
    );
    Ok(rule_set)
}

// =============================================================================
// Tests
// =============================================================================
