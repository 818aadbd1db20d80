// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Row filter trees.

use serde::Serialize;
use serde_json::Value;

use super::path::FieldPath;
use crate::ability::{Condition, RuleSet};

// =============================================================================
// FilterTree
// =============================================================================

/// A boolean tree of path equalities restricting which rows are returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTree {
    /// Every child holds. Empty means true.
    And(Vec<FilterTree>),
    /// Some child holds. Empty means false.
    Or(Vec<FilterTree>),
    /// The child does not hold.
    Not(Box<FilterTree>),
    /// The value at `path` equals `value`.
    Eq {
        /// Dotted path.
        path: FieldPath,
        /// Literal, bound as a parameter.
        value: Value,
    },
}

impl FilterTree {
    /// A filter matching no rows.
    pub fn nothing() -> Self {
        Self::Or(Vec::new())
    }

    /// Creates an equality leaf.
    pub fn eq(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if the filter can never match.
    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Or(children) if children.is_empty())
    }

    /// Evaluates the filter against an in-memory row.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(row)),
            Self::Or(children) => children.iter().any(|c| c.matches(row)),
            Self::Not(child) => !child.matches(row),
            Self::Eq { path, value } => path.matches(row, value),
        }
    }
}

impl From<&Condition> for FilterTree {
    fn from(condition: &Condition) -> Self {
        let mut leaves: Vec<FilterTree> = condition
            .iter()
            .map(|(path, value)| FilterTree::eq(path, value.clone()))
            .collect();
        if leaves.len() == 1 {
            leaves.remove(0)
        } else {
            FilterTree::And(leaves)
        }
    }
}

// =============================================================================
// Translation
// =============================================================================

/// Translates the rules covering `(action, resource)` into a row filter.
///
/// Returns `None` when access is unrestricted: a `manage all` grant is
/// present, or the highest priority unconditional rule allows without any
/// higher priority inverted condition. Otherwise allowing conditions are
/// OR-ed, each condition's equalities AND-ed, and inverted conditions of
/// higher priority are AND-ed in as negations. With no allowing condition
/// the result matches nothing.
///
/// # Examples
///
/// ```
/// use campus_core::ability::{Grant, RuleSet};
/// use campus_core::filter::{to_filter, FilterTree};
///
/// let rules = RuleSet::try_new(vec![
///     Grant::new("get", "Course").when("teacher.user.id", 2),
/// ]).unwrap();
///
/// assert_eq!(
///     to_filter(&rules, "get", "Course"),
///     Some(FilterTree::Or(vec![FilterTree::eq("teacher.user.id", 2)])),
/// );
/// assert_eq!(to_filter(&rules, "delete", "Course"), Some(FilterTree::nothing()));
/// ```
pub fn to_filter(rules: &RuleSet, action: &str, resource: &str) -> Option<FilterTree> {
    if rules.is_absolute() {
        return None;
    }

    let mut any_of = Vec::new();
    let mut none_of = Vec::new();

    for rule in rules.rules_for(action, resource) {
        // Field-restricted prohibitions do not hide whole rows.
        if rule.inverted && rule.attributes.is_some() {
            continue;
        }

        match (rule.condition(), rule.inverted) {
            (None, true) => break,
            (None, false) => {
                return if none_of.is_empty() {
                    None
                } else {
                    Some(FilterTree::And(none_of))
                };
            }
            (Some(condition), false) => any_of.push(FilterTree::from(condition)),
            (Some(condition), true) => {
                none_of.push(FilterTree::Not(Box::new(FilterTree::from(condition))))
            }
        }
    }

    if any_of.is_empty() {
        return Some(FilterTree::nothing());
    }

    let allowed = FilterTree::Or(any_of);
    if none_of.is_empty() {
        Some(allowed)
    } else {
        none_of.push(allowed);
        Some(FilterTree::And(none_of))
    }
}

// =============================================================================
// Tests
// =============================================================================
