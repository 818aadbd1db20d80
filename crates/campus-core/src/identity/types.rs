// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identifier and role types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AbilityError;

// =============================================================================
// UserId
// =============================================================================

/// Numeric identifier of a subject.
///
/// # Examples
///
/// ```
/// use campus_core::identity::UserId;
///
/// let id: UserId = "42".parse().unwrap();
/// assert_eq!(id, UserId::new(42));
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new user ID.
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Role
// =============================================================================

/// Role tags a subject can hold.
///
/// Each role maps to a fixed set of rules (see `ability::role_rules`).
/// Parsing an unrecognised tag is an error rather than a silent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Full access to everything.
    Admin,
    /// Reads and edits the courses they teach.
    Teacher,
    /// Reads the courses they are actively enrolled in.
    Student,
}

impl Role {
    /// All roles in enumeration order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    /// Returns the role tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }

    /// Parses a list of role tags, failing on the first unknown tag.
    pub fn parse_all<I, S>(tags: I) -> Result<Vec<Role>, AbilityError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter().map(|tag| tag.as_ref().parse()).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Teacher" => Ok(Role::Teacher),
            "Student" => Ok(Role::Student),
            other => Err(AbilityError::unknown_role(other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = AbilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
