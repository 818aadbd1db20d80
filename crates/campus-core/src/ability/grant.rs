// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission grants and their row conditions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{actions, resources};
use crate::error::{AbilityError, AbilityResult};
use crate::filter::FieldPath;

// =============================================================================
// Condition
// =============================================================================

/// A row condition: every dotted path must equal its literal.
///
/// Keys are dotted paths that may traverse relationships
/// (`teacher.user.id`). Values are scalars. When a path crosses an array,
/// the condition holds if any element satisfies it.
///
/// # Examples
///
/// ```
/// use campus_core::ability::Condition;
/// use serde_json::json;
///
/// let cond = Condition::new().with("teacher.user.id", 2);
/// assert!(cond.matches(&json!({ "teacher": { "user": { "id": 2 } } })));
/// assert!(!cond.matches(&json!({ "teacher": { "user": { "id": 3 } } })));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, Value>);

impl Condition {
    /// Creates an empty condition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path equality.
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(path.into(), value.into());
        self
    }

    /// Returns the literal for a path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    /// Iterates over `(path, literal)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of path equalities.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the condition has no equalities.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates the condition against a resource instance.
    pub fn matches(&self, instance: &Value) -> bool {
        self.iter()
            .all(|(path, expected)| FieldPath::from_dotted(path).matches(instance, expected))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Condition {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// Grant
// =============================================================================

/// A single permission record.
///
/// Reads as "may perform `action` on instances of `resource` matching
/// `condition`, restricted to `attributes` if present". An inverted grant
/// forbids instead of allowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// Action name, or `manage` for any action.
    pub action: String,
    /// Resource type, or `all` for any resource.
    pub resource: String,
    /// Row condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Field restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    /// Forbids rather than allows.
    #[serde(default, skip_serializing_if = "is_false")]
    pub inverted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Grant {
    /// Creates an unconditional, unrestricted grant.
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            condition: None,
            attributes: None,
            inverted: false,
        }
    }

    /// Creates the absolute `manage all` grant.
    pub fn manage_all() -> Self {
        Self::new(actions::MANAGE, resources::ALL)
    }

    /// Adds a path equality to the condition.
    pub fn when(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition = Some(self.condition.take().unwrap_or_default().with(path, value));
        self
    }

    /// Restricts the grant to the given fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Turns the grant into a prohibition.
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Returns the condition if it has at least one equality.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref().filter(|c| !c.is_empty())
    }

    /// Returns `true` if the grant covers the action and resource, either
    /// exactly or through the `manage` / `all` wildcards.
    pub fn applies_to(&self, action: &str, resource: &str) -> bool {
        (self.action == action || self.action == actions::MANAGE)
            && (self.resource == resource || self.resource == resources::ALL)
    }

    /// Returns `true` for a non-inverted `manage all` grant.
    pub fn is_absolute(&self) -> bool {
        !self.inverted && self.action == actions::MANAGE && self.resource == resources::ALL
    }

    /// Returns `true` if the grant takes part in a type-level check.
    ///
    /// Inverted grants only forbid at type level when they carry neither a
    /// condition nor a field restriction.
    pub(crate) fn matches_type(&self) -> bool {
        !self.inverted || (self.condition().is_none() && self.attributes.is_none())
    }

    /// Returns `true` if the grant takes part in a check on `instance`.
    pub(crate) fn matches_instance(&self, instance: &Value) -> bool {
        if self.inverted && self.attributes.is_some() {
            return false;
        }
        self.condition().is_none_or(|c| c.matches(instance))
    }

    /// Checks the grant is well formed.
    pub fn validate(&self) -> AbilityResult<()> {
        let invalid = |message: String| {
            AbilityError::invalid_grant(&self.action, &self.resource, message)
        };

        if self.action.trim().is_empty() {
            return Err(invalid("action is empty".to_string()));
        }
        if self.resource.trim().is_empty() {
            return Err(invalid("resource is empty".to_string()));
        }

        if let Some(condition) = &self.condition {
            for (path, value) in condition.iter() {
                if path.split('.').any(str::is_empty) {
                    return Err(invalid(format!("condition path '{}' has an empty segment", path)));
                }
                if value.is_array() || value.is_object() {
                    return Err(invalid(format!("condition value for '{}' is not a scalar", path)));
                }
            }
        }

        if let Some(attributes) = &self.attributes {
            if attributes.iter().any(|a| a.trim().is_empty()) {
                return Err(invalid("attribute name is empty".to_string()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "cannot ")?;
        }
        write!(f, "{} {}", self.action, self.resource)?;
        if let Some(condition) = self.condition() {
            let parts: Vec<String> = condition
                .iter()
                .map(|(path, value)| format!("{} = {}", path, value))
                .collect();
            write!(f, " where {}", parts.join(" and "))?;
        }
        if let Some(attributes) = &self.attributes {
            write!(f, " fields [{}]", attributes.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
